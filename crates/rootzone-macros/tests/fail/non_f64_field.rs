use rootzone_macros::Fluxes;

#[derive(Fluxes)]
pub struct Record {
    pub storage: f64,
    pub unit: i64,
}

fn main() {}
