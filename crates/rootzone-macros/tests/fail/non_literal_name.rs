use rootzone_macros::Fluxes;

#[derive(Fluxes)]
#[fluxes(timeseries_name = Series)]
pub struct Record {
    pub storage: f64,
}

fn main() {}
