use pystream_macros::Fluxes;

#[derive(Debug, Clone, Copy, Fluxes)]
pub struct BasinFluxes {
    pub precip: f64,
    pub pet: f64,
    pub gauge_flow: f64,
}

fn main() {
    let f = BasinFluxes { precip: 80.0, pet: 20.0, gauge_flow: 1.5 };
    let mut ts = BasinFluxesTimeseries::with_capacity(12);
    assert!(ts.is_empty());
    ts.push(&f);
    ts.push(&BasinFluxes { precip: 0.0, pet: 5.0, gauge_flow: 0.5 });
    assert_eq!(ts.len(), 2);
    assert_eq!(ts.get(1).map(|m| m.pet), Some(5.0));
    assert!(ts.get(2).is_none());

    let columns = ts.columns();
    assert_eq!(columns[2].0, "gauge_flow");
    assert_eq!(columns[2].1, &[1.5, 0.5]);
    assert_eq!(BasinFluxes::field_names(), &["precip", "pet", "gauge_flow"]);
}
