use crate::error::Result;

/// Core trait for spatially distributed hydrological models.
///
/// Defines the interface a gridded model implements: prepare a run-constant
/// context from parameters and the basin, initialize state, step one period,
/// and run over a forcing sequence.
pub trait HydrologicalModel {
    const NAME: &'static str;
    type Params;
    /// Static description of the basin (terrain rasters).
    type Domain;
    type State: Clone;
    /// Forcing of one timestep, borrowing the gridded inputs.
    type Forcing<'a>;
    type Fluxes;
    type FluxesTimeseries: FluxesTimeseriesOps<Self::Fluxes>;
    /// Precomputed data derived from params and domain, constant for a run.
    type Context;

    /// Precompute run-constant data (flow network, scaled capacities, ...).
    fn prepare(params: &Self::Params, domain: &Self::Domain) -> Result<Self::Context>;

    /// Create the initial state for a run.
    fn initialize_state(context: &Self::Context) -> Self::State;

    /// Execute one timestep: given state, params, forcing and context,
    /// return the new state and fluxes. The input state is left untouched.
    fn step(
        state: &Self::State,
        params: &Self::Params,
        forcing: &Self::Forcing<'_>,
        context: &Self::Context,
    ) -> Result<(Self::State, Self::Fluxes)>;

    /// Run the model over a forcing sequence.
    ///
    /// Default implementation: prepare context, initialize or use the provided
    /// state, loop over forcing calling step.
    fn run(
        params: &Self::Params,
        domain: &Self::Domain,
        forcing: &[Self::Forcing<'_>],
        initial_state: Option<&Self::State>,
    ) -> Result<Self::FluxesTimeseries> {
        let context = Self::prepare(params, domain)?;
        let mut state = match initial_state {
            Some(s) => s.clone(),
            None => Self::initialize_state(&context),
        };

        let mut outputs = Self::FluxesTimeseries::with_capacity(forcing.len());
        for f in forcing {
            let (new_state, fluxes) = Self::step(&state, params, f, &context)?;
            outputs.push(&fluxes);
            state = new_state;
        }

        Ok(outputs)
    }
}

/// Operations required on the timeseries collection type.
pub trait FluxesTimeseriesOps<F> {
    fn with_capacity(n: usize) -> Self;
    fn push(&mut self, f: &F);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// Calibration contract of a parameter set.
pub trait ModelParams: Sized {
    const N_PARAMS: usize;
    const PARAM_NAMES: &'static [&'static str];
    const PARAM_BOUNDS: &'static [(f64, f64)];

    fn from_array(arr: &[f64]) -> Result<Self>;
    fn to_array(&self) -> Vec<f64>;
}
