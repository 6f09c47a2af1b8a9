//! Primitive estimators: c4 and c5
//!
//! c4 is the bias correction of the sample standard deviation under
//! normality:
//!
//! ```text
//! c4(n) = sqrt(2 / (n - 1)) * Γ(n/2) / Γ((n-1)/2)
//! ```
//!
//! Γ(n/2) overflows f64 for n around 340, while the ratio stays near 1, so
//! the ratio is formed as exp(ln Γ(n/2) − ln Γ((n−1)/2)).
//!
//! # References
//!
//! - Montgomery, D.C. *Introduction to Statistical Quality Control*, Table 6.9
//! - SAS/QC documentation, function C4

use crate::core::normal::ln_gamma;
use crate::core::params::SampleSize;

/// Unbiasing constant c4 for the sample standard deviation
pub fn c4(n: SampleSize) -> f64 {
    let n = n.get();
    let gamma_ratio = (ln_gamma(n / 2.0) - ln_gamma((n - 1.0) / 2.0)).exp();
    (2.0 / (n - 1.0)).sqrt() * gamma_ratio
}

/// Standard deviation factor c5 = sqrt(1 − c4²), from an already computed c4
pub fn c5_from_c4(c4: f64) -> f64 {
    (1.0 - c4 * c4).sqrt()
}

/// c5 for sample size `n`
pub fn c5(n: SampleSize) -> f64 {
    c5_from_c4(c4(n))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn c4_in_unit_interval(size in 2.0_f64..1e5) {
            let v = c4(SampleSize::new(size).unwrap());
            prop_assert!(v > 0.0 && v < 1.0, "c4({}) = {}", size, v);
        }

        #[test]
        fn c4_increases_with_n(size in 2.0_f64..1000.0) {
            let lo = c4(SampleSize::new(size).unwrap());
            let hi = c4(SampleSize::new(size + 1.0).unwrap());
            prop_assert!(hi > lo, "c4({}) = {} >= c4({}) = {}", size, lo, size + 1.0, hi);
        }

        #[test]
        fn c5_completes_c4(size in 2.0_f64..1e4) {
            let n = SampleSize::new(size).unwrap();
            let (a, b) = (c4(n), c5(n));
            prop_assert!((a * a + b * b - 1.0).abs() < 1e-12);
        }
    }
}
