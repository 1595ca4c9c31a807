/// Flat-array view of a parameter set, as used by calibration drivers and bindings.
pub trait ModelParams: Sized {
    const N_PARAMS: usize;
    const PARAM_NAMES: &'static [&'static str];

    /// Build a validated parameter set from a flat slice in `PARAM_NAMES` order.
    fn from_array(arr: &[f64]) -> Result<Self, crate::RootZoneError>;

    /// Flatten to a vector in `PARAM_NAMES` order.
    fn to_array(&self) -> Vec<f64>;
}
