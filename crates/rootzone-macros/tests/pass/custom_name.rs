use rootzone_macros::Fluxes;

#[derive(Debug, Clone, Copy, Fluxes)]
#[fluxes(timeseries_name = "BalanceSeries")]
pub struct BalanceRecord {
    pub rainfall: f64,
    pub quick_flow: f64,
}

fn main() {
    let f = BalanceRecord { rainfall: 5.0, quick_flow: 3.0 };
    let mut ts = BalanceSeries::with_capacity(4);
    ts.push(&f);
    ts.push(&f);
    assert_eq!(ts.len(), 2);
    assert_eq!(BalanceRecord::field_names(), &["rainfall", "quick_flow"]);
}
