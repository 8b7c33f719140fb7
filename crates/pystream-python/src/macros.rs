/// Convert a `FluxesTimeseries` struct into a `PyDict` of 1-D arrays.
macro_rules! timeseries_to_dict {
    ($py:expr, $ts:expr, $($field:ident),+ $(,)?) => {{
        let dict = pyo3::types::PyDict::new($py);
        $(
            dict.set_item(stringify!($field), numpy::PyArray1::from_vec($py, $ts.$field))?;
        )+
        dict
    }};
}
