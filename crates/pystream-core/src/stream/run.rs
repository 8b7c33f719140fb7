/// STREAM model orchestration.
///
/// - `step()`: Execute one month over every cell and route the outflow
/// - `StreamModel`: `HydrologicalModel` implementation over a `Terrain`
use tracing::warn;

use super::constants::MONTH_SECONDS;
use super::fluxes::{Fluxes, FluxesTimeseries};
use super::params::Parameters;
use super::processes;
use super::state::State;
use crate::error::Result;
use crate::grid::{Grid, Shape};
use crate::routing::{FlowNetwork, Outlet};
use crate::terrain::Terrain;
use crate::traits::HydrologicalModel;

/// Forcing of one month.
///
/// `heat_index` and `alpha` are the annual Thornthwaite terms of the year the
/// month belongs to.
#[derive(Debug, Clone, Copy)]
pub struct MonthForcing<'a> {
    pub precip: &'a Grid,
    pub temp: &'a Grid,
    pub heat_index: &'a Grid,
    pub alpha: &'a Grid,
    pub daylight_hours: f64,
}

impl MonthForcing<'_> {
    fn ensure_shape(&self, shape: Shape) -> Result<()> {
        self.precip.ensure_shape("precipitation grid", shape)?;
        self.temp.ensure_shape("temperature grid", shape)?;
        self.heat_index.ensure_shape("heat index grid", shape)?;
        self.alpha.ensure_shape("alpha grid", shape)
    }
}

/// Run-constant data derived from the terrain and parameters.
#[derive(Debug, Clone)]
pub struct StreamContext {
    network: FlowNetwork,
    /// Crop factor times `cropf_coeff`.
    cropf: Grid,
    /// Water holding capacity times `whc_coeff` [mm].
    whc: Grid,
    cell_area: f64,
    outlet: Outlet,
}

impl StreamContext {
    pub fn new(params: &Parameters, terrain: &Terrain) -> Self {
        let network = FlowNetwork::d8(terrain.dem(), terrain.dem_nodata(), terrain.cell_size());
        let terminal = network.n_terminal();
        if terminal > 1 {
            warn!(cells = terminal, "flow terminates in more than one cell (pits, flats or edges)");
        }
        Self {
            network,
            cropf: terrain.cropf().map(|v| v * params.cropf_coeff),
            whc: terrain.whc().map(|v| v * params.whc_coeff),
            cell_area: terrain.cell_area(),
            outlet: Outlet::default(),
        }
    }

    /// Read the discharge at `outlet` instead of the maximum accumulation.
    pub fn with_outlet(mut self, outlet: Outlet) -> Result<Self> {
        outlet.validate(self.shape())?;
        if let Outlet::Cell { row, col } = outlet {
            if !self.network.is_valid(row * self.shape().1 + col) {
                warn!(row, col, "gauge lies on a nodata cell, its flow is always 0");
            }
        }
        self.outlet = outlet;
        Ok(self)
    }

    pub fn shape(&self) -> Shape {
        self.network.shape()
    }

    pub fn network(&self) -> &FlowNetwork {
        &self.network
    }

    pub fn cropf(&self) -> &Grid {
        &self.cropf
    }

    pub fn whc(&self) -> &Grid {
        &self.whc
    }

    pub fn cell_area(&self) -> f64 {
        self.cell_area
    }

    pub fn outlet(&self) -> Outlet {
        self.outlet
    }
}

const N_MEANS: usize = 13;

/// Running means of the per-cell fluxes, skipping NaN values.
#[derive(Default)]
struct BasinMean {
    sum: [f64; N_MEANS],
    count: [usize; N_MEANS],
}

impl BasinMean {
    fn add(&mut self, values: [f64; N_MEANS]) {
        for (k, v) in values.into_iter().enumerate() {
            if !v.is_nan() {
                self.sum[k] += v;
                self.count[k] += 1;
            }
        }
    }

    /// NaN where no cell contributed.
    fn means(&self) -> [f64; N_MEANS] {
        std::array::from_fn(|k| {
            if self.count[k] == 0 {
                f64::NAN
            } else {
                self.sum[k] / self.count[k] as f64
            }
        })
    }
}

/// Execute one month of STREAM.
///
/// Every cell goes through snow, PET, soil storage and flow separation; the
/// resulting runoff plus base flow volumes are accumulated along the D8
/// network and read at the outlet. Basin values of the fluxes are means
/// over valid cells, ignoring NaN.
///
/// Returns (new_state, fluxes).
pub fn step(
    state: &State,
    params: &Parameters,
    forcing: &MonthForcing<'_>,
    context: &StreamContext,
) -> Result<(State, Fluxes)> {
    let shape = context.shape();
    state.ensure_shape(shape)?;
    forcing.ensure_shape(shape)?;

    let precip = forcing.precip.as_slice();
    let temp = forcing.temp.as_slice();
    let heat_index = forcing.heat_index.as_slice();
    let alpha = forcing.alpha.as_slice();
    let cropf = context.cropf.as_slice();
    let whc = context.whc.as_slice();
    let valid = context.network.valid_mask();
    let snow_prev = state.snow_accum.as_slice();
    let aw_prev = state.available_water.as_slice();
    let gw_prev = state.ground_water.as_slice();

    let n = precip.len();
    let mut snow_accum = Vec::with_capacity(n);
    let mut available_water = Vec::with_capacity(n);
    let mut ground_water = Vec::with_capacity(n);
    let mut volumes = Vec::with_capacity(n);

    let mut basin = BasinMean::default();
    let mut outflow_volume = 0.0;

    for i in 0..n {
        let (p, t) = (precip[i], temp[i]);

        // 1. Snow
        let (liquid, pack, snowfall, melt) = processes::snow(
            p,
            t,
            snow_prev[i],
            params.temp_snow_fall,
            params.temp_snow_melt,
            params.snow_melt_coeff,
        );

        // 2. PET
        let pet = processes::potential_evapotranspiration(
            t,
            heat_index[i],
            alpha[i],
            forcing.daylight_hours,
        ) * cropf[i];

        // 3. Soil storage
        let (excess, aw) = processes::soil_storage(liquid, pet, aw_prev[i], whc[i]);

        // 4. Flow separation
        let (runoff, recharge, base_flow, gw) =
            processes::separate_flow(excess, gw_prev[i], params.togw, params.c);

        let volume = processes::outflow_volume(runoff + base_flow, context.cell_area);

        snow_accum.push(pack);
        available_water.push(aw);
        ground_water.push(gw);
        volumes.push(volume);

        if valid[i] {
            basin.add([
                p, t, snowfall, melt, liquid, pet, excess, runoff, recharge, base_flow, pack, aw,
                gw,
            ]);
            if !volume.is_nan() {
                outflow_volume += volume;
            }
        }
    }

    // 5. Routing
    let accumulated = context.network.accumulate(&volumes)?;
    let gauge_volume = context.outlet.read(&accumulated);

    let m = basin.means();

    let new_state = State {
        snow_accum: Grid::new(shape.0, shape.1, snow_accum)?,
        available_water: Grid::new(shape.0, shape.1, available_water)?,
        ground_water: Grid::new(shape.0, shape.1, ground_water)?,
    };

    let fluxes = Fluxes {
        precip: m[0],
        temp: m[1],
        snowfall: m[2],
        snow_melt: m[3],
        liquid_precip: m[4],
        pet: m[5],
        excess: m[6],
        runoff: m[7],
        recharge: m[8],
        base_flow: m[9],
        snow_accum: m[10],
        available_water: m[11],
        ground_water: m[12],
        outflow_volume,
        gauge_volume,
        gauge_flow: gauge_volume / MONTH_SECONDS,
    };

    Ok((new_state, fluxes))
}

/// Marker type for the STREAM model.
pub struct StreamModel;

impl HydrologicalModel for StreamModel {
    const NAME: &'static str = "STREAM";
    type Params = Parameters;
    type Domain = Terrain;
    type State = State;
    type Forcing<'a> = MonthForcing<'a>;
    type Fluxes = Fluxes;
    type FluxesTimeseries = FluxesTimeseries;
    type Context = StreamContext;

    fn prepare(params: &Self::Params, domain: &Self::Domain) -> Result<Self::Context> {
        params.validate()?;
        Ok(StreamContext::new(params, domain))
    }

    fn initialize_state(context: &Self::Context) -> Self::State {
        State::initialize(context.shape())
    }

    fn step(
        state: &Self::State,
        params: &Self::Params,
        forcing: &Self::Forcing<'_>,
        context: &Self::Context,
    ) -> Result<(Self::State, Self::Fluxes)> {
        step(state, params, forcing, context)
    }
}
