//! Standard normal distribution math for experiment analysis.
//!
//! Provides the normal CDF, its inverse, and percentile interval extraction
//! used by the hypothesis test, the sample-size planner, and the posterior
//! summaries.

use std::f64::consts::{PI, SQRT_2};

/// Lower breakpoint between the tail and central regions of the inverse CDF.
const PPF_LOW: f64 = 0.024_25;
/// Upper breakpoint between the central and tail regions of the inverse CDF.
const PPF_HIGH: f64 = 1.0 - PPF_LOW;

// Rational approximation coefficients for the central region.
const PPF_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const PPF_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];

// Rational approximation coefficients for the tails.
const PPF_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const PPF_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];

/// Standard normal cumulative distribution function.
///
/// Uses the complementary error function identity
/// `Phi(x) = 0.5 * erfc(-x / sqrt(2))`, which keeps full relative precision
/// deep into the lower tail.
///
/// # Examples
/// ```
/// use abtest_core::distribution::normal_cdf;
///
/// assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
/// assert!((normal_cdf(1.96) - 0.975_002).abs() < 1e-6);
/// ```
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x / SQRT_2)
}

/// Inverse of the standard normal CDF (the probit / percent-point function).
///
/// Rational approximation in three regions (Acklam) followed by one Halley
/// refinement step against [`normal_cdf`]. Accurate to better than 1e-9 on
/// `(0.0001, 0.9999)`.
///
/// Returns `-inf` for `p <= 0` and `+inf` for `p >= 1`; callers clamp.
///
/// # Examples
/// ```
/// use abtest_core::distribution::normal_inverse_ppf;
///
/// assert!((normal_inverse_ppf(0.975) - 1.959_964).abs() < 1e-5);
/// assert_eq!(normal_inverse_ppf(0.0), f64::NEG_INFINITY);
/// ```
#[must_use]
pub fn normal_inverse_ppf(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let x = if p < PPF_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        tail_ratio(q)
    } else if p <= PPF_HIGH {
        let q = p - 0.5;
        let r = q * q;
        let num = ((((PPF_A[0] * r + PPF_A[1]) * r + PPF_A[2]) * r + PPF_A[3]) * r + PPF_A[4]) * r
            + PPF_A[5];
        let den =
            ((((PPF_B[0] * r + PPF_B[1]) * r + PPF_B[2]) * r + PPF_B[3]) * r + PPF_B[4]) * r + 1.0;
        num * q / den
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -tail_ratio(q)
    };

    // Halley step; skipped where exp(x^2 / 2) overflows (subnormal p)
    let e = normal_cdf(x) - p;
    let u = e * (2.0 * PI).sqrt() * (x * x / 2.0).exp();
    if !u.is_finite() {
        return x;
    }
    x - u / (1.0 + x * u / 2.0)
}

fn tail_ratio(q: f64) -> f64 {
    let num =
        ((((PPF_C[0] * q + PPF_C[1]) * q + PPF_C[2]) * q + PPF_C[3]) * q + PPF_C[4]) * q + PPF_C[5];
    let den = (((PPF_D[0] * q + PPF_D[1]) * q + PPF_D[2]) * q + PPF_D[3]) * q + 1.0;
    num / den
}

/// Extracts a central percentile interval from a sorted sample.
///
/// For `confidence_level = 0.95` this returns the 2.5th and 97.5th
/// percentiles. The input must already be sorted ascending.
///
/// # Returns
/// Tuple of (lower, upper); `(0.0, 0.0)` for an empty sample.
#[must_use]
pub fn percentile_ci(sorted: &[f64], confidence_level: f64) -> (f64, f64) {
    if sorted.is_empty() {
        return (0.0, 0.0);
    }
    if sorted.len() == 1 {
        return (sorted[0], sorted[0]);
    }

    let alpha = 1.0 - confidence_level;
    (
        percentile(sorted, alpha / 2.0),
        percentile(sorted, 1.0 - alpha / 2.0),
    )
}

/// Linear-interpolated percentile of a sorted sample, `q` in [0, 1].
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}
