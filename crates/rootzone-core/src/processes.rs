/// Root-zone process functions.
///
/// Pure functions for the saturation-excess rainfall partition and the diagnostic
/// fluxes. Storage and rainfall are depths per step [mm].
use crate::constants::{
    AET_SUPPLY_FACTOR, DOMAIN_EPSILON, M2_PER_KM2, MM_PER_M, NO_VALUE,
};
use crate::error::NumericalFault;
use crate::params::Parameters;

/// Result of the saturation-excess partition for one unit and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    /// Fraction of rainfall routed to quick flow, in [0, 1].
    pub alpha: f64,
    /// Excess over the total capacity of the distributed store.
    pub ut1: f64,
    /// Excess generated by the saturated part of the store.
    pub ut2: f64,
}

impl Partition {
    /// Partition of a dry step.
    pub const DRY: Partition = Partition {
        alpha: 0.0,
        ut1: 0.0,
        ut2: 0.0,
    };
}

/// Raise `base` to `exp`, treating a round-off negative base as zero.
fn checked_pow(base: f64, exp: f64, what: &str) -> Result<f64, NumericalFault> {
    if base < -DOMAIN_EPSILON {
        return Err(NumericalFault::Domain(format!(
            "negative base {base} for fractional power in {what}"
        )));
    }
    Ok(base.max(0.0).powf(exp))
}

/// Hymod-style probability-distributed store: split rainfall into infiltration
/// and quick flow.
///
/// `storage` is the store level before the step, `rainfall` the step depth,
/// `max_storage` the mean capacity Smax and `pore_size_index` the shape exponent pB.
/// A dry step returns [`Partition::DRY`] without touching the formula.
///
/// Fails when the storage lies above the capacity (negative base for the
/// fractional power) or when an input is negative or non-finite.
pub fn partition(
    storage: f64,
    rainfall: f64,
    max_storage: f64,
    pore_size_index: f64,
) -> Result<Partition, NumericalFault> {
    if !rainfall.is_finite() || rainfall < 0.0 {
        return Err(NumericalFault::Domain(format!(
            "rainfall must be a finite non-negative depth, got {rainfall}"
        )));
    }
    if !storage.is_finite() {
        return Err(NumericalFault::Domain(format!(
            "storage must be finite, got {storage}"
        )));
    }
    if rainfall == 0.0 {
        return Ok(Partition::DRY);
    }

    let b1 = pore_size_index + 1.0;

    // Maximum point capacity of the distributed store
    let c_max = max_storage * b1;

    // Critical capacity currently filled
    let coeff1 = 1.0 - b1 * storage / c_max;
    let ct_prev = c_max * (1.0 - checked_pow(coeff1, 1.0 / b1, "critical capacity")?);

    // Rainfall in excess of the whole distribution
    let ut1 = (rainfall - c_max + ct_prev).max(0.0);

    // Storage reached after filling with the remaining rainfall
    let dummy = ((ct_prev + rainfall - ut1) / c_max).min(1.0);
    let coeff2 = 1.0 - dummy;
    let xn = c_max / b1 * (1.0 - checked_pow(coeff2, b1, "filled storage")?);

    // Rainfall falling on the saturated fraction
    let ut2 = (rainfall - ut1 - (xn - storage)).max(0.0);

    let alpha = (ut1 + ut2) / rainfall;
    if !alpha.is_finite() {
        return Err(NumericalFault::Domain(format!(
            "partition coefficient is not finite (S = {storage}, P = {rainfall})"
        )));
    }
    // Cancellation in UT1 on a full store can push alpha a few ulps past 1.
    let alpha = alpha.clamp(0.0, 1.0);

    Ok(Partition { alpha, ut1, ut2 })
}

/// Root uptake `a * S^b`; zero when the root zone is not connected to the canopy.
pub fn root_uptake(storage: f64, params: &Parameters) -> f64 {
    if !params.connect_to_canopy {
        return 0.0;
    }
    params.uptake_coeff * storage.max(0.0).powf(params.uptake_exponent)
}

/// Supply-limited actual evapotranspiration.
///
/// Scales linearly with the saturation degree and reaches the net potential ET
/// once `1.33 * S / Smax >= 1`. Never negative.
pub fn actual_et(storage: f64, net_pet: f64, max_storage: f64) -> f64 {
    let supply = (AET_SUPPLY_FACTOR * storage / max_storage).min(1.0);
    (net_pet * supply).max(0.0)
}

/// Power-law drainage `Pmax * S^b` towards the lower layer.
pub fn drainage(storage: f64, drainage_rate: f64, drainage_exponent: f64) -> f64 {
    drainage_rate * storage.max(0.0).powf(drainage_exponent)
}

/// Replace the no-value sentinel and NaN with zero.
pub fn normalize_input(value: f64) -> f64 {
    if value.is_nan() || value == NO_VALUE {
        0.0
    } else {
        value
    }
}

/// Net potential ET available to the root zone after wet-canopy evaporation.
pub fn net_pet(pet: f64, wet_canopy_evaporation: f64) -> f64 {
    normalize_input(pet) - normalize_input(wet_canopy_evaporation)
}

/// Convert a quick-flow depth per step [mm] into a discharge [m³/s].
pub fn quick_flow_rate(depth: f64, params: &Parameters) -> f64 {
    depth / MM_PER_M * params.unit_area * M2_PER_KM2 / params.timestep_seconds()
}

/// Inverse of [`quick_flow_rate`]: discharge [m³/s] back to a depth per step [mm].
pub fn quick_flow_depth(rate: f64, params: &Parameters) -> f64 {
    rate * params.timestep_seconds() / (params.unit_area * M2_PER_KM2) * MM_PER_M
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: assert two f64 values are close.
    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected} ± {tol}, got {actual}"
        );
    }

    fn test_params() -> Parameters {
        Parameters::new(4.0, 0.33, 0.05, 1.5, 0.000958, 1.83, true, 3.79, 60.0).unwrap()
    }

    // -- Partition --

    #[test]
    fn dry_step_has_zero_alpha() {
        let p = partition(2.0, 0.0, 4.0, 0.33).unwrap();
        assert_eq!(p, Partition::DRY);
        assert_eq!(p.alpha, 0.0);
    }

    #[test]
    fn partition_reference_values() {
        // Half-full store, first bootstrap probe
        let p = partition(2.0, 1.0, 4.0, 0.33).unwrap();
        assert_approx(p.alpha, 0.205_589_854_143_268_8, 1e-12);

        // Storm on a nearly half-full store
        let p = partition(1.996_599_254_366_423_5, 5.0, 4.0, 0.33).unwrap();
        assert_approx(p.alpha, 0.599_319_850_873_284_8, 1e-9);
    }

    #[test]
    fn partition_alpha_in_unit_interval() {
        for &s in &[0.0, 0.5, 1.0, 2.0, 3.0, 3.9, 4.0] {
            for &rain in &[0.01, 1.0, 5.0, 50.0] {
                for &pb in &[-0.5, 0.0, 0.33, 2.0] {
                    let p = partition(s, rain, 4.0, pb).unwrap();
                    assert!(p.ut1 >= 0.0, "UT1 < 0 for S={s}, P={rain}, pB={pb}");
                    assert!(p.ut2 >= 0.0, "UT2 < 0 for S={s}, P={rain}, pB={pb}");
                    assert!(
                        (0.0..=1.0).contains(&p.alpha),
                        "alpha = {} for S={s}, P={rain}, pB={pb}",
                        p.alpha
                    );
                }
            }
        }
    }

    #[test]
    fn full_store_routes_everything_to_quick_flow() {
        let p = partition(4.0, 1.0, 4.0, 0.33).unwrap();
        assert_approx(p.alpha, 1.0, 1e-12);
        assert_approx(p.ut1, 1.0, 1e-12);
    }

    #[test]
    fn empty_store_small_rain_mostly_infiltrates() {
        let p = partition(0.0, 0.1, 4.0, 0.33).unwrap();
        assert!(p.alpha < 0.05, "alpha = {}", p.alpha);
    }

    #[test]
    fn full_store_light_rain_stays_bounded() {
        let p = partition(4.0, 0.01, 4.0, -0.5).unwrap();
        assert!(p.alpha <= 1.0);
        assert_approx(p.alpha, 1.0, 1e-3);
    }

    #[test]
    fn overfull_store_is_domain_error() {
        let err = partition(4.5, 1.0, 4.0, 0.33).unwrap_err();
        assert!(matches!(err, NumericalFault::Domain(_)));
    }

    #[test]
    fn round_off_above_capacity_is_tolerated() {
        let p = partition(4.0 + 1e-14, 1.0, 4.0, 0.33).unwrap();
        assert_approx(p.alpha, 1.0, 1e-9);
    }

    #[test]
    fn negative_or_nan_rainfall_is_domain_error() {
        assert!(partition(2.0, -1.0, 4.0, 0.33).is_err());
        assert!(partition(2.0, f64::NAN, 4.0, 0.33).is_err());
        assert!(partition(f64::NAN, 1.0, 4.0, 0.33).is_err());
    }

    // -- Diagnostic fluxes --

    #[test]
    fn uptake_disabled_without_canopy() {
        let p = test_params().with_canopy(false);
        assert_eq!(root_uptake(3.0, &p), 0.0);
    }

    #[test]
    fn uptake_power_law() {
        let p = test_params();
        assert_approx(root_uptake(2.0, &p), 0.05 * 2.0f64.powf(1.5), 1e-12);
        assert_eq!(root_uptake(0.0, &p), 0.0);
    }

    #[test]
    fn diagnostics_are_pure() {
        let p = test_params();
        for &s in &[0.0, 0.7, 2.0, 4.0] {
            assert_eq!(root_uptake(s, &p), root_uptake(s, &p));
            assert_eq!(actual_et(s, 3.0, 4.0), actual_et(s, 3.0, 4.0));
            assert_eq!(drainage(s, 0.000958, 1.83), drainage(s, 0.000958, 1.83));
        }
    }

    #[test]
    fn actual_et_monotone_and_capped() {
        let net = 2.5;
        let mut prev = 0.0;
        for i in 0..=40 {
            let s = 4.0 * i as f64 / 40.0;
            let aet = actual_et(s, net, 4.0);
            assert!(aet >= prev, "AET decreased at S={s}");
            assert!(aet <= net);
            prev = aet;
        }
        assert_approx(actual_et(4.0, net, 4.0), net, 1e-12);
        assert_approx(actual_et(1.0, net, 4.0), net * 1.33 / 4.0, 1e-12);
    }

    #[test]
    fn actual_et_never_negative() {
        assert_eq!(actual_et(2.0, -1.0, 4.0), 0.0);
        assert_eq!(actual_et(0.0, 3.0, 4.0), 0.0);
    }

    #[test]
    fn drainage_and_uptake_monotone() {
        let p = test_params();
        let mut prev_d = 0.0;
        let mut prev_u = 0.0;
        for i in 0..=40 {
            let s = 4.0 * i as f64 / 40.0;
            let d = drainage(s, p.drainage_rate, p.drainage_exponent);
            let u = root_uptake(s, &p);
            assert!(d >= prev_d);
            assert!(u >= prev_u);
            prev_d = d;
            prev_u = u;
        }
    }

    #[test]
    fn drainage_reads_negative_storage_as_empty() {
        assert_eq!(drainage(-0.5, 0.1, 1.83), 0.0);
    }

    // -- Inputs and conversions --

    #[test]
    fn normalize_no_value() {
        assert_eq!(normalize_input(NO_VALUE), 0.0);
        assert_eq!(normalize_input(f64::NAN), 0.0);
        assert_eq!(normalize_input(3.5), 3.5);
    }

    #[test]
    fn net_pet_subtracts_wet_canopy() {
        assert_approx(net_pet(3.0, 1.0), 2.0, 1e-12);
        assert_approx(net_pet(NO_VALUE, 1.0), -1.0, 1e-12);
        assert_approx(net_pet(3.0, NO_VALUE), 3.0, 1e-12);
    }

    #[test]
    fn quick_flow_conversion() {
        let p = test_params();
        // 1 mm over 3.79 km² in one hour
        assert_approx(quick_flow_rate(1.0, &p), 3.79e3 / 3600.0, 1e-12);
        assert_approx(quick_flow_depth(quick_flow_rate(2.5, &p), &p), 2.5, 1e-12);
    }
}
