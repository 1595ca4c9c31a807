/// Pure Rust core benchmarks for the root-zone engine.
///
/// Uses std::time::Instant for timing, a deterministic LCG PRNG for data generation,
/// and std::hint::black_box to prevent dead-code elimination.
use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::{Duration, Instant};

use rootzone_core::run::{self, RootZoneModel};
use rootzone_core::{
    FirstStepPolicy, ForcingSeries, Integrator, Parameters, RootZoneError, StepForcing,
    StepSettings, UnitId,
};

const REPEATS: usize = 7;

/// Simple LCG PRNG for deterministic hourly data: intermittent rain and small PET.
fn make_data(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut state = seed;
    let mut next_f64 = || -> f64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let rainfall: Vec<f64> = (0..n)
        .map(|_| {
            let r = next_f64();
            if r < 0.8 { 0.0 } else { (r - 0.8) * 25.0 }
        })
        .collect();
    let pet: Vec<f64> = (0..n).map(|_| next_f64() * 0.3).collect();
    (rainfall, pet)
}

/// Run a closure `REPEATS` times, return the median duration.
///
/// Stops at the first failing repeat.
fn median_time<T, F>(mut f: F) -> Result<Duration, RootZoneError>
where
    F: FnMut() -> Result<T, RootZoneError>,
{
    let mut times = Vec::with_capacity(REPEATS);
    for _ in 0..REPEATS {
        let start = Instant::now();
        f()?;
        times.push(start.elapsed());
    }
    times.sort();
    Ok(times[REPEATS / 2])
}

fn bench_params() -> Result<Parameters, RootZoneError> {
    Parameters::new(4.0, 0.33, 0.05, 1.0, 0.000958, 1.83, true, 3.79, 60.0)
}

fn bench_single_unit(
    label: &'static str,
    integrator: Integrator,
    sizes: &[usize],
) -> Result<Vec<(&'static str, usize, Duration)>, RootZoneError> {
    let params = bench_params()?;
    let settings = StepSettings::new(integrator, FirstStepPolicy::default());
    let mut results = Vec::new();

    for &n in sizes {
        let (rainfall, pet) = make_data(n, 42);
        let forcing = ForcingSeries::new(rainfall, Some(pet), None)?;

        // Warmup
        black_box(run::run(&params, &settings, &forcing, None)?);

        let dur = median_time(|| run::run(&params, &settings, &forcing, None).map(black_box))?;
        results.push((label, n, dur));
    }
    Ok(results)
}

fn bench_stepper(
    n_units: usize,
    n_steps: usize,
) -> Result<(&'static str, usize, Duration), RootZoneError> {
    let params = bench_params()?;
    let (rainfall, pet) = make_data(n_units * n_steps, 7);
    let steps: Vec<StepForcing> = (0..n_steps)
        .map(|t| {
            let ids = 0..n_units as UnitId;
            let row = t * n_units;
            let rain: BTreeMap<UnitId, f64> =
                ids.clone().map(|id| (id, rainfall[row + id as usize])).collect();
            let et: BTreeMap<UnitId, f64> =
                ids.map(|id| (id, pet[row + id as usize])).collect();
            StepForcing::new(rain).with_pet(et)
        })
        .collect();

    let template =
        RootZoneModel::new(params, Integrator::high_order(), FirstStepPolicy::default())?;
    let dur = median_time(|| {
        let mut model = template.clone();
        for forcing in &steps {
            model.step(forcing).into_result().map(black_box)?;
        }
        Ok(model)
    })?;
    Ok(("stepper", n_units * n_steps, dur))
}

fn main() -> Result<(), RootZoneError> {
    println!("Pure Rust Core Benchmarks");
    println!("============================================================");
    println!("{:<18} {:>6}   {:>12}", "Model", "N", "Median (ms)");
    println!("--------------------------------------------");

    let mut all_results: Vec<(&str, usize, Duration)> = Vec::new();

    all_results.extend(bench_single_unit("dop853", Integrator::high_order(), &[8760, 87600])?);
    all_results.extend(bench_single_unit("euler", Integrator::fixed_step(1), &[8760, 87600])?);
    all_results.push(bench_stepper(500, 240)?);

    for (model, n, dur) in &all_results {
        let ms = dur.as_secs_f64() * 1000.0;
        println!("{:<18} {:>6}      {:>8.2}", model, n, ms);
    }

    println!("============================================================");
    Ok(())
}
