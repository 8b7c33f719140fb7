//! `pystream._core`: numpy front-end to the STREAM model.
#[macro_use]
mod macros;
mod convert;

mod metrics;
mod stream;

use pyo3::prelude::*;

/// Attach `child` to `parent` and make it importable as
/// `<parent>.<child>` through `sys.modules`.
pub(crate) fn add_submodule(parent: &Bound<'_, PyModule>, child: &Bound<'_, PyModule>) -> PyResult<()> {
    parent.add_submodule(child)?;
    let qualified = format!("{}.{}", parent.name()?, child.name()?);
    parent
        .py()
        .import("sys")?
        .getattr("modules")?
        .set_item(qualified, child)
}

#[pyfunction]
fn rust_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rust_version, m)?)?;
    stream::register(m)?;
    metrics::register(m)?;
    Ok(())
}
