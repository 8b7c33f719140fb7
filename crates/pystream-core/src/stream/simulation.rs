/// Monthly STREAM simulation over a basin.
///
/// Owns the terrain, the climate forcing and the parameters, and drives
/// `run::step` month by month. The annual heat index is either supplied by
/// the caller or computed for every simulated year from its temperatures.
use tracing::{debug, info, warn};

use super::constants::{MAX_DAYLIGHT_HOURS, MONTHS_PER_YEAR, REFERENCE_DAYLIGHT_HOURS};
use super::fluxes::FluxesTimeseries;
use super::heat;
use super::params::Parameters;
use super::run::{self, MonthForcing, StreamContext};
use super::state::State;
use crate::error::{Result, StreamError};
use crate::forcing::ClimateForcing;
use crate::grid::Grid;
use crate::metrics;
use crate::routing::Outlet;
use crate::terrain::Terrain;

#[derive(Debug, Clone)]
pub struct MonthlySimulation {
    terrain: Terrain,
    forcing: ClimateForcing,
    params: Parameters,
    /// Day length of successive months, cycled over the simulation.
    daylight_hours: Vec<f64>,
    context: StreamContext,
    state: State,
    gauge_flow: Option<Vec<f64>>,
}

impl MonthlySimulation {
    pub fn new(terrain: Terrain, forcing: ClimateForcing, params: Parameters) -> Result<Self> {
        params.validate()?;
        let shape = terrain.shape();
        if forcing.shape() != shape {
            return Err(StreamError::shape("climate grids", shape, forcing.shape()));
        }
        let context = StreamContext::new(&params, &terrain);
        Ok(Self {
            state: State::initialize(shape),
            terrain,
            forcing,
            params,
            daylight_hours: vec![REFERENCE_DAYLIGHT_HOURS],
            context,
            gauge_flow: None,
        })
    }

    /// Day length of each month [h], repeated once exhausted (usually twelve
    /// values starting at the first simulated month).
    pub fn with_daylight_hours(mut self, hours: Vec<f64>) -> Result<Self> {
        if hours.is_empty() {
            return Err(StreamError::InvalidInput(
                "monthly daylight hours must not be empty".to_string(),
            ));
        }
        if let Some(h) = hours
            .iter()
            .find(|h| !(0.0..=MAX_DAYLIGHT_HOURS).contains(*h))
        {
            return Err(StreamError::InvalidInput(format!(
                "daylight hours must lie in [0, {MAX_DAYLIGHT_HOURS}], got {h}"
            )));
        }
        self.daylight_hours = hours;
        Ok(self)
    }

    /// Read the discharge at a fixed gauge cell.
    pub fn with_outlet(mut self, outlet: Outlet) -> Result<Self> {
        self.context = self.context.with_outlet(outlet)?;
        Ok(self)
    }

    /// Run the model over every month of the forcing.
    ///
    /// The stores are emptied first, so calling `simulate` again with the
    /// same arguments gives the same result. With `heat_index`, it is used
    /// for every month and `alpha` defaults to the Thornthwaite exponent of
    /// it. Without, the heat index of each year is computed from its twelve
    /// temperature grids times `heat_coeff`, and the number of months must
    /// be a multiple of twelve.
    pub fn simulate(
        &mut self,
        heat_index: Option<&Grid>,
        alpha: Option<&Grid>,
    ) -> Result<FluxesTimeseries> {
        let shape = self.terrain.shape();
        let n = self.forcing.num_months();
        let cell_size = self.terrain.cell_size();
        info!(
            rows = shape.0,
            cols = shape.1,
            months = n,
            res_x = cell_size.x,
            res_y = cell_size.y,
            "starting STREAM simulation"
        );

        let mut state = State::initialize(shape);
        let mut out = FluxesTimeseries::with_capacity(n);

        match heat_index {
            Some(hi) => {
                hi.ensure_shape("heat index grid", shape)?;
                let computed;
                let alpha = match alpha {
                    Some(a) => {
                        a.ensure_shape("alpha grid", shape)?;
                        a
                    }
                    None => {
                        computed = heat::alpha_grid(hi);
                        &computed
                    }
                };
                for m in 0..n {
                    state = self.advance(m, &state, hi, alpha, &mut out)?;
                }
            }
            None => {
                if n % MONTHS_PER_YEAR != 0 {
                    return Err(StreamError::IncompleteYear { months: n });
                }
                if alpha.is_some() {
                    warn!("alpha is ignored when the heat index is computed from temperature");
                }
                for year in 0..n / MONTHS_PER_YEAR {
                    let months = year * MONTHS_PER_YEAR..(year + 1) * MONTHS_PER_YEAR;
                    let temps: Vec<&Grid> = self.forcing.temp_frames(months.clone()).iter().collect();
                    debug!(year, "computing annual heat index");
                    let hi = heat::annual_heat_index(&temps, self.params.heat_coeff)?;
                    let alpha = heat::alpha_grid(&hi);
                    for m in months {
                        state = self.advance(m, &state, &hi, &alpha, &mut out)?;
                    }
                }
            }
        }

        let peak = out.gauge_flow.iter().copied().fold(0.0, f64::max);
        info!(months = out.len(), peak_gauge_flow = peak, "simulation finished");

        self.state = state;
        self.gauge_flow = Some(out.gauge_flow.clone());
        Ok(out)
    }

    fn advance(
        &self,
        month: usize,
        state: &State,
        heat_index: &Grid,
        alpha: &Grid,
        out: &mut FluxesTimeseries,
    ) -> Result<State> {
        let forcing = MonthForcing {
            precip: self.forcing.precip(month),
            temp: self.forcing.temp(month),
            heat_index,
            alpha,
            daylight_hours: self.daylight_hours[month % self.daylight_hours.len()],
        };
        let (new_state, fluxes) = run::step(state, &self.params, &forcing, &self.context)?;
        debug!(month, gauge_flow = fluxes.gauge_flow, "simulated month");
        out.push(&fluxes);
        Ok(new_state)
    }

    /// Nash-Sutcliffe efficiency of the last simulation against `observed`
    /// [m³/s], ignoring the first `warmup_months` of both series.
    pub fn nash_sutcliffe(&self, observed: &[f64], warmup_months: usize) -> Result<f64> {
        let simulated = self.gauge_flow.as_deref().ok_or(StreamError::NotSimulated)?;
        metrics::nash_sutcliffe(simulated, observed, warmup_months)
    }

    /// Discharge at the gauge [m³/s] of the last simulation.
    pub fn gauge_flow(&self) -> Option<&[f64]> {
        self.gauge_flow.as_deref()
    }

    /// State after the last simulated month.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn num_months(&self) -> usize {
        self.forcing.num_months()
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn forcing(&self) -> &ClimateForcing {
        &self.forcing
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn daylight_hours(&self) -> &[f64] {
        &self.daylight_hours
    }

    pub fn context(&self) -> &StreamContext {
        &self.context
    }
}
