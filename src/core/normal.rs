//! Standard normal distribution and gamma helpers
//!
//! Both tails are computed from `erfc` directly so that Φ(x) near 0 and
//! 1 − Φ(x) near 0 keep full relative precision. The integrands for d2 and
//! d3 raise these to the n-th power, where a complement formed by
//! subtraction would cancel.

use std::f64::consts::FRAC_1_SQRT_2;

/// Standard normal cumulative distribution function Φ(x)
pub fn cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal survival function 1 − Φ(x), accurate in the upper tail
pub fn sf(x: f64) -> f64 {
    0.5 * libm::erfc(x * FRAC_1_SQRT_2)
}

/// Natural log of the gamma function, ln Γ(x), for x > 0
pub fn ln_gamma(x: f64) -> f64 {
    libm::lgamma(x)
}

/// 1 − p^n where `q = 1 − p` is known to full precision
///
/// For p close to 1 the power is formed through `ln_1p(-q)` and `exp_m1`,
/// so the result keeps its leading digits instead of rounding to zero.
pub(crate) fn one_minus_pow(p: f64, q: f64, n: f64) -> f64 {
    if p > 0.5 {
        -(n * (-q).ln_1p()).exp_m1()
    } else {
        1.0 - p.powf(n)
    }
}
