use pystream_macros::Fluxes;

#[derive(Debug, Clone, Copy, Fluxes)]
#[fluxes(timeseries_name = "SnowSeries")]
pub struct SnowFluxes {
    pub snowfall: f64,
    pub snow_melt: f64,
}

fn main() {
    let mut ts = SnowSeries::with_capacity(3);
    ts.push(&SnowFluxes { snowfall: 12.0, snow_melt: 0.0 });
    assert_eq!(ts.len(), 1);
    assert_eq!(ts.snowfall, vec![12.0]);
    assert_eq!(SnowFluxes::field_names(), &["snowfall", "snow_melt"]);
}
