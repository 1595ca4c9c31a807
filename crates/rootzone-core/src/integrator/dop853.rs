//! Dormand–Prince 8(5,3) explicit Runge–Kutta with adaptive step control.
//!
//! Coefficients from Hairer, Nørsett & Wanner, "Solving Ordinary Differential
//! Equations I", DOP853. The 5th and 3rd order embedded estimators are blended into
//! one error norm; step size follows `h * clamp(0.9 * err^(-1/8), 0.2, 10)`.

#![allow(clippy::excessive_precision, clippy::needless_range_loop)]

use super::AdaptiveSettings;
use crate::error::NumericalFault;
use crate::ode::OdeSystem;

const N_STAGES: usize = 12;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 8.0;

const C: [f64; N_STAGES] = [
    0.0,
    0.526001519587677318785587544488e-01,
    0.789002279381515978178381316732e-01,
    0.118350341907227396726757197510,
    0.281649658092772603273242802490,
    0.333333333333333333333333333333,
    0.25,
    0.307692307692307692307692307692,
    0.651282051282051282051282051282,
    0.6,
    0.857142857142857142857142857142,
    1.0,
];

#[rustfmt::skip]
const A: [[f64; N_STAGES]; N_STAGES] = [
    [0.0; N_STAGES],
    [
        5.26001519587677318785587544488e-2,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        1.97250569845378994544595329183e-2,
        5.91751709536136983633785987549e-2,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        2.95875854768068491816892993775e-2,
        0.0,
        8.87627564304205475450678981324e-2,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        2.41365134159266685502369798665e-1,
        0.0,
        -8.84549479328286085344864962717e-1,
        9.24834003261792003115737966543e-1,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        3.7037037037037037037037037037e-2,
        0.0,
        0.0,
        1.70828608729473871279604482173e-1,
        1.25467687566822425016691814123e-1,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        3.7109375e-2,
        0.0,
        0.0,
        1.70252211019544039314978060272e-1,
        6.02165389804559606850219397283e-2,
        -1.7578125e-2,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        3.70920001185047927108779319836e-2,
        0.0,
        0.0,
        1.70383925712239993810214054705e-1,
        1.07262030446373284651809199168e-1,
        -1.53194377486244017527936158236e-2,
        8.27378916381402288758473766002e-3,
        0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    [
        6.24110958716075717114429577812e-1,
        0.0,
        0.0,
        -3.36089262944694129406857109825,
        -8.68219346841726006818189891453e-1,
        2.75920996994467083049415600797e1,
        2.01540675504778934086186788979e1,
        -4.34898841810699588477366255144e1,
        0.0, 0.0, 0.0, 0.0,
    ],
    [
        4.77662536438264365890433908527e-1,
        0.0,
        0.0,
        -2.48811461997166764192642586468,
        -5.90290826836842996371446475743e-1,
        2.12300514481811942347288949897e1,
        1.52792336328824235832596922938e1,
        -3.32882109689848629194453265587e1,
        -2.03312017085086261358222928593e-2,
        0.0, 0.0, 0.0,
    ],
    [
        -9.3714243008598732571704021658e-1,
        0.0,
        0.0,
        5.18637242884406370830023853209,
        1.09143734899672957818500254654,
        -8.14978701074692612513997267357,
        -1.85200656599969598641566180701e1,
        2.27394870993505042818970056734e1,
        2.49360555267965238987089396762,
        -3.0467644718982195003823669022,
        0.0, 0.0,
    ],
    [
        2.27331014751653820792359768449,
        0.0,
        0.0,
        -1.05344954667372501984066689879e1,
        -2.00087205822486249909675718444,
        -1.79589318631187989172765950534e1,
        2.79488845294199600508499808837e1,
        -2.85899827713502369474065508674,
        -8.87285693353062954433549289258,
        1.23605671757943030647266201528e1,
        6.43392746015763530355970484046e-1,
        0.0,
    ],
];

/// 8th order weights.
const B: [f64; N_STAGES] = [
    5.42937341165687622380535766363e-2,
    0.0,
    0.0,
    0.0,
    0.0,
    4.45031289275240888144113950566,
    1.89151789931450038304281599044,
    -5.8012039600105847814672114227,
    3.1116436695781989440891606237e-1,
    -1.52160949662516078556178806805e-1,
    2.01365400804030348374776537501e-1,
    4.47106157277725905176885569043e-2,
];

/// 8th order weights minus the 3rd order embedded weights.
const E3: [f64; N_STAGES] = [
    5.42937341165687622380535766363e-2 - 0.244094488188976377952755905512,
    0.0,
    0.0,
    0.0,
    0.0,
    4.45031289275240888144113950566,
    1.89151789931450038304281599044,
    -5.8012039600105847814672114227,
    3.1116436695781989440891606237e-1 - 0.733846688281611857341361741547,
    -1.52160949662516078556178806805e-1,
    2.01365400804030348374776537501e-1,
    4.47106157277725905176885569043e-2 - 0.220588235294117647058823529412e-1,
];

/// 8th order weights minus the 5th order embedded weights.
const E5: [f64; N_STAGES] = [
    0.1312004499419488073250102996e-1,
    0.0,
    0.0,
    0.0,
    0.0,
    -0.1225156446376204440720569753e1,
    -0.4957589496572501915214079952,
    0.1664377182454986536961530415e1,
    -0.3503288487499736816886487290,
    0.3341791187130174790297318841,
    0.8192320648511571246570742613e-1,
    -0.2235530786388629525884427845e-1,
];

/// Counters from one adaptive integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dop853Stats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// Integrate `system` from `t = 0` to `t = span` starting at `y0`.
///
/// Returns the state at `span` and the step counters. Fails when the accepted +
/// rejected step count reaches `settings.max_steps` or the step size drops below
/// `settings.min_step_fraction * span`.
pub fn integrate<const N: usize, S: OdeSystem<N>>(
    system: &S,
    y0: [f64; N],
    span: f64,
    settings: &AdaptiveSettings,
) -> Result<([f64; N], Dop853Stats), NumericalFault> {
    let mut stats = Dop853Stats::default();
    if span == 0.0 {
        return Ok((y0, stats));
    }
    if !span.is_finite() || span < 0.0 {
        return Err(NumericalFault::Integration(format!(
            "invalid integration span {span}"
        )));
    }

    let min_step = settings.min_step_fraction * span;
    let mut t = 0.0;
    let mut y = y0;
    let mut h = span;
    let mut last_rejected = false;

    let mut k = [[0.0; N]; N_STAGES];
    system.derivatives(t, &y, &mut k[0]);
    stats.evaluations += 1;

    while t < span {
        if stats.accepted + stats.rejected >= settings.max_steps {
            return Err(NumericalFault::Integration(format!(
                "step budget of {} exhausted at t = {t:.6}",
                settings.max_steps
            )));
        }

        let last = t + h >= span;
        if last {
            h = span - t;
        }
        if h < min_step {
            return Err(NumericalFault::Integration(format!(
                "step size {h:e} below minimum {min_step:e} at t = {t:.6}"
            )));
        }

        for s in 1..N_STAGES {
            let mut ys = y;
            for (i, yi) in ys.iter_mut().enumerate() {
                let mut acc = 0.0;
                for j in 0..s {
                    acc += A[s][j] * k[j][i];
                }
                *yi += h * acc;
            }
            system.derivatives(t + C[s] * h, &ys, &mut k[s]);
        }
        stats.evaluations += N_STAGES - 1;

        let mut y_new = y;
        let mut err5 = 0.0;
        let mut err3 = 0.0;
        for i in 0..N {
            let mut inc = 0.0;
            let mut e5 = 0.0;
            let mut e3 = 0.0;
            for s in 0..N_STAGES {
                inc += B[s] * k[s][i];
                e5 += E5[s] * k[s][i];
                e3 += E3[s] * k[s][i];
            }
            y_new[i] = y[i] + h * inc;

            let scale = settings.atol + settings.rtol * y[i].abs().max(y_new[i].abs());
            err5 += (e5 / scale).powi(2);
            err3 += (e3 / scale).powi(2);
        }

        let err = if err5 == 0.0 && err3 == 0.0 {
            0.0
        } else {
            h * err5 / ((err5 + 0.01 * err3) * N as f64).sqrt()
        };

        let finite = err.is_finite() && y_new.iter().all(|v| v.is_finite());
        if finite && err <= 1.0 {
            t = if last { span } else { t + h };
            y = y_new;
            stats.accepted += 1;

            let mut factor = if err == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
            };
            if last_rejected {
                factor = factor.min(1.0);
            }
            last_rejected = false;
            h *= factor;

            if t < span {
                system.derivatives(t, &y, &mut k[0]);
                stats.evaluations += 1;
            }
        } else {
            let factor = if finite {
                (SAFETY * err.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            h *= factor;
            stats.rejected += 1;
            last_rejected = true;
        }
    }

    Ok((y, stats))
}
