use numpy::PyReadonlyArray1;
use pyo3::prelude::*;

use crate::convert::{contiguous_slice, to_py_err};

use pystream_core::metrics;
use pystream_core::stream::constants::DEFAULT_WARMUP_MONTHS;

macro_rules! metric_fn {
    ($name:ident) => {
        #[pyfunction]
        fn $name<'py>(
            observed: PyReadonlyArray1<'py, f64>,
            simulated: PyReadonlyArray1<'py, f64>,
        ) -> PyResult<f64> {
            metrics::$name(contiguous_slice(&observed)?, contiguous_slice(&simulated)?)
                .map_err(to_py_err)
        }
    };
}

metric_fn!(nse);
metric_fn!(log_nse);
metric_fn!(kge);
metric_fn!(pbias);
metric_fn!(rmse);
metric_fn!(mae);

/// NSE of simulated against observed gauge flow after the warm-up months.
#[pyfunction]
#[pyo3(signature = (simulated, observed, num_warmup_months=DEFAULT_WARMUP_MONTHS))]
fn nash_sutcliffe<'py>(
    simulated: PyReadonlyArray1<'py, f64>,
    observed: PyReadonlyArray1<'py, f64>,
    num_warmup_months: usize,
) -> PyResult<f64> {
    metrics::nash_sutcliffe(
        contiguous_slice(&simulated)?,
        contiguous_slice(&observed)?,
        num_warmup_months,
    )
    .map_err(to_py_err)
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "metrics")?;
    m.add_function(wrap_pyfunction!(nse, &m)?)?;
    m.add_function(wrap_pyfunction!(log_nse, &m)?)?;
    m.add_function(wrap_pyfunction!(kge, &m)?)?;
    m.add_function(wrap_pyfunction!(pbias, &m)?)?;
    m.add_function(wrap_pyfunction!(rmse, &m)?)?;
    m.add_function(wrap_pyfunction!(mae, &m)?)?;
    m.add_function(wrap_pyfunction!(nash_sutcliffe, &m)?)?;
    crate::add_submodule(parent, &m)
}
