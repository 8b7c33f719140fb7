/// STREAM model flux outputs.
///
/// `Fluxes` holds one month aggregated over the basin's valid cells; the
/// derived `FluxesTimeseries` holds the full simulation (Vec of each field).
use pystream_macros::Fluxes;

use crate::traits::FluxesTimeseriesOps;

/// Single-month fluxes, returned by `step()`.
///
/// Depths are basin means [mm/month]; volumes are basin totals [m³].
#[derive(Debug, Clone, Copy, Default, PartialEq, Fluxes)]
pub struct Fluxes {
    pub precip: f64,
    pub temp: f64,
    pub snowfall: f64,
    pub snow_melt: f64,
    pub liquid_precip: f64,
    pub pet: f64,
    pub excess: f64,
    pub runoff: f64,
    pub recharge: f64,
    pub base_flow: f64,
    pub snow_accum: f64,
    pub available_water: f64,
    pub ground_water: f64,
    /// Runoff plus base flow of every cell [m³].
    pub outflow_volume: f64,
    /// Accumulated flow at the gauge [m³/month].
    pub gauge_volume: f64,
    /// Discharge at the gauge [m³/s].
    pub gauge_flow: f64,
}

impl FluxesTimeseriesOps<Fluxes> for FluxesTimeseries {
    fn with_capacity(n: usize) -> Self {
        FluxesTimeseries::with_capacity(n)
    }

    fn push(&mut self, f: &Fluxes) {
        FluxesTimeseries::push(self, f)
    }

    fn len(&self) -> usize {
        FluxesTimeseries::len(self)
    }

    fn is_empty(&self) -> bool {
        FluxesTimeseries::is_empty(self)
    }
}
