use numpy::{PyArray1, PyArray2, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use pystream_core::grid::Grid;
use pystream_core::StreamError;

/// Every core error surfaces as `ValueError`.
pub fn to_py_err(e: StreamError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Validate that a numpy array is C-contiguous and return its slice.
pub fn contiguous_slice<'py>(arr: &'py PyReadonlyArray1<'py, f64>) -> PyResult<&'py [f64]> {
    arr.as_slice()
        .map_err(|_| PyValueError::new_err("array must be C-contiguous"))
}

/// Copy a 2-D array into a grid (any memory layout).
pub fn grid_from_array(arr: &PyReadonlyArray2<'_, f64>) -> PyResult<Grid> {
    let view = arr.as_array();
    let (rows, cols) = view.dim();
    Grid::new(rows, cols, view.iter().copied().collect()).map_err(to_py_err)
}

/// Split a `(time, row, col)` array into one grid per time step.
pub fn frames_from_array(arr: &PyReadonlyArray3<'_, f64>, name: &str) -> PyResult<Vec<Grid>> {
    let view = arr.as_array();
    let (n_times, rows, cols) = view.dim();
    if n_times == 0 {
        return Err(PyValueError::new_err(format!("{name} has no time steps")));
    }
    view.outer_iter()
        .map(|frame| Grid::new(rows, cols, frame.iter().copied().collect()).map_err(to_py_err))
        .collect()
}

pub fn grid_to_array<'py>(py: Python<'py>, grid: &Grid) -> PyResult<Bound<'py, PyArray2<f64>>> {
    PyArray1::from_slice(py, grid.as_slice()).reshape([grid.rows(), grid.cols()])
}
