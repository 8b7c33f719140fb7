use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::convert::{
    contiguous_slice, frames_from_array, grid_from_array, grid_to_array, to_py_err,
};

use pystream_core::forcing::{ClimateForcing, ClimateSeries};
use pystream_core::raster::CellSize;
use pystream_core::routing::Outlet;
use pystream_core::stream::{MonthlySimulation, Parameters};
use pystream_core::terrain::{Terrain, DEFAULT_NODATA, DEFAULT_WHC_EPSILON};
use pystream_core::traits::ModelParams;

/// Run a full STREAM simulation on numpy rasters.
///
/// `precip` and `temp` are `(month, row, col)` stacks; the terrain rasters
/// are `(row, col)`. Returns a dict of monthly flux arrays plus the final
/// state under `"state"`.
#[pyfunction]
#[pyo3(signature = (
    dem, cropf, whc, precip, temp, resolution,
    params=None, daylight_hours=None, heat_index=None, alpha=None,
    outlet=None, nodata=DEFAULT_NODATA, whc_epsilon=DEFAULT_WHC_EPSILON,
))]
#[allow(clippy::too_many_arguments)]
fn stream_run<'py>(
    py: Python<'py>,
    dem: PyReadonlyArray2<'py, f64>,
    cropf: PyReadonlyArray2<'py, f64>,
    whc: PyReadonlyArray2<'py, f64>,
    precip: PyReadonlyArray3<'py, f64>,
    temp: PyReadonlyArray3<'py, f64>,
    resolution: (f64, f64),
    params: Option<PyReadonlyArray1<'py, f64>>,
    daylight_hours: Option<PyReadonlyArray1<'py, f64>>,
    heat_index: Option<PyReadonlyArray2<'py, f64>>,
    alpha: Option<PyReadonlyArray2<'py, f64>>,
    outlet: Option<(usize, usize)>,
    nodata: f64,
    whc_epsilon: f64,
) -> PyResult<Bound<'py, PyDict>> {
    let parameters = match &params {
        Some(arr) => Parameters::from_array(contiguous_slice(arr)?).map_err(to_py_err)?,
        None => Parameters::default(),
    };
    let cell_size = CellSize::new(resolution.0, resolution.1).map_err(to_py_err)?;

    let terrain = Terrain::from_grids(
        grid_from_array(&dem)?,
        Some(nodata),
        grid_from_array(&cropf)?,
        grid_from_array(&whc)?,
        cell_size,
        whc_epsilon,
    )
    .map_err(to_py_err)?;
    let forcing = ClimateForcing::new(
        ClimateSeries {
            name: "precip".into(),
            frames: frames_from_array(&precip, "precip")?,
        },
        ClimateSeries {
            name: "temp".into(),
            frames: frames_from_array(&temp, "temp")?,
        },
    )
    .map_err(to_py_err)?;

    let mut sim = MonthlySimulation::new(terrain, forcing, parameters).map_err(to_py_err)?;
    if let Some(hours) = &daylight_hours {
        sim = sim
            .with_daylight_hours(contiguous_slice(hours)?.to_vec())
            .map_err(to_py_err)?;
    }
    if let Some((row, col)) = outlet {
        sim = sim.with_outlet(Outlet::Cell { row, col }).map_err(to_py_err)?;
    }

    let heat_index = heat_index.as_ref().map(grid_from_array).transpose()?;
    let alpha = alpha.as_ref().map(grid_from_array).transpose()?;
    if alpha.is_some() && heat_index.is_none() {
        return Err(PyValueError::new_err(
            "alpha can only be given together with heat_index",
        ));
    }

    let result = sim
        .simulate(heat_index.as_ref(), alpha.as_ref())
        .map_err(to_py_err)?;

    let dict = timeseries_to_dict!(
        py,
        result,
        precip,
        temp,
        snowfall,
        snow_melt,
        liquid_precip,
        pet,
        excess,
        runoff,
        recharge,
        base_flow,
        snow_accum,
        available_water,
        ground_water,
        outflow_volume,
        gauge_volume,
        gauge_flow,
    );

    let state = sim.state();
    let state_dict = PyDict::new(py);
    state_dict.set_item("snow_accum", grid_to_array(py, &state.snow_accum)?)?;
    state_dict.set_item("available_water", grid_to_array(py, &state.available_water)?)?;
    state_dict.set_item("ground_water", grid_to_array(py, &state.ground_water)?)?;
    dict.set_item("state", state_dict)?;

    Ok(dict)
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "stream")?;
    m.add_function(wrap_pyfunction!(stream_run, &m)?)?;
    crate::add_submodule(parent, &m)
}
