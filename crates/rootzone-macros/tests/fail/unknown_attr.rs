use rootzone_macros::Fluxes;

#[derive(Fluxes)]
#[fluxes(window = 3)]
pub struct Record {
    pub storage: f64,
}

fn main() {}
