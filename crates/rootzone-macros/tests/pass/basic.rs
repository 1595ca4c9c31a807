use rootzone_macros::Fluxes;

#[derive(Debug, Clone, Copy, Fluxes)]
pub struct UnitFluxes {
    pub actual_input: f64,
    pub storage: f64,
    pub drainage: f64,
}

fn main() {
    let f = UnitFluxes { actual_input: 1.0, storage: 2.0, drainage: 0.5 };
    let mut ts = UnitFluxesTimeseries::with_capacity(10);
    assert!(ts.is_empty());
    ts.push(&f);
    assert_eq!(ts.len(), 1);
    assert_eq!(ts.storage, vec![2.0]);
    assert_eq!(UnitFluxes::field_names(), &["actual_input", "storage", "drainage"]);
    assert_eq!(f.to_array(), [1.0, 2.0, 0.5]);
}
