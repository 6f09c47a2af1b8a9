//! Control chart constants for one (n, z) pair
//!
//! A [`ConstantSet`] validates its arguments on construction and computes
//! every constant lazily, at most once, behind a `OnceLock`. Values depend
//! only on n and z (plus the quadrature tolerances), so every read returns
//! the same bits.
//!
//! | Constant | Formula            | Lower clamp |
//! |----------|--------------------|-------------|
//! | A        | z/√n               |             |
//! | A2       | z/(d2·√n)          |             |
//! | A3       | z/(c4·√n)          |             |
//! | B3, B4   | 1 ∓ (z/c4)·c5      | B3 ≥ 0      |
//! | B5, B6   | c4 ∓ z·c5          | B5 ≥ 0      |
//! | D1, D2   | d2 ∓ z·d3          | D1 ≥ 0      |
//! | D3, D4   | 1 ∓ z·d3/d2        | D3 ≥ 0      |
//! | E2       | z/d2               |             |
//! | E3       | z/c4               |             |
//!
//! A clamped lower limit breaks the pairwise identities (B3 + B4 = 2 and so
//! on); those hold only while the lower constant is positive.

#![allow(non_snake_case)]

use serde::Serialize;
use std::sync::OnceLock;

use crate::core::error::ConstantError;
use crate::core::params::{SampleSize, SigmaLimit};
use crate::core::primitives;
use crate::core::range::RangeEstimator;

/// Constants derived from c4 and c5 (standard deviation charts)
#[derive(Debug, Clone, Copy, PartialEq)]
struct DeviationFactors {
    c5: f64,
    a3: f64,
    b3: f64,
    b4: f64,
    b5: f64,
    b6: f64,
    e3: f64,
}

/// Constants derived from d2 and d3 (range charts)
#[derive(Debug, Clone, Copy, PartialEq)]
struct RangeFactors {
    a2: f64,
    big_d1: f64,
    big_d2: f64,
    big_d3: f64,
    big_d4: f64,
    e2: f64,
}

/// Control chart constants for sample size `n` and sigma limit `z`
#[derive(Debug)]
pub struct ConstantSet {
    n: SampleSize,
    z: SigmaLimit,
    estimator: RangeEstimator,
    c4: OnceLock<f64>,
    deviation: OnceLock<DeviationFactors>,
    d2: OnceLock<Result<f64, ConstantError>>,
    d3: OnceLock<Result<f64, ConstantError>>,
    range: OnceLock<Result<RangeFactors, ConstantError>>,
}

impl ConstantSet {
    /// Validate `n >= 2` and `z > 0` and build an uncached constant set
    pub fn new(n: f64, z: f64) -> Result<Self, ConstantError> {
        Self::with_estimator(n, z, RangeEstimator::default())
    }

    /// Constant set for 3-sigma limits
    pub fn sample_size(n: f64) -> Result<Self, ConstantError> {
        Self::new(n, SigmaLimit::default().get())
    }

    /// Build with a configured (possibly cached) range estimator
    pub fn with_estimator(
        n: f64,
        z: f64,
        estimator: RangeEstimator,
    ) -> Result<Self, ConstantError> {
        Ok(Self::from_parts(
            SampleSize::new(n)?,
            SigmaLimit::new(z)?,
            estimator,
        ))
    }

    pub fn from_parts(n: SampleSize, z: SigmaLimit, estimator: RangeEstimator) -> Self {
        Self {
            n,
            z,
            estimator,
            c4: OnceLock::new(),
            deviation: OnceLock::new(),
            d2: OnceLock::new(),
            d3: OnceLock::new(),
            range: OnceLock::new(),
        }
    }

    pub fn n(&self) -> f64 {
        self.n.get()
    }

    pub fn z(&self) -> f64 {
        self.z.get()
    }

    pub fn sample(&self) -> SampleSize {
        self.n
    }

    pub fn sigma(&self) -> SigmaLimit {
        self.z
    }

    /// `ConstantSet(n, z=z)`
    pub fn repr(&self) -> String {
        format!("ConstantSet({}, z={})", self.n, self.z)
    }

    // ---------------------------------------------------------------------
    // Primitives
    // ---------------------------------------------------------------------

    pub fn c4(&self) -> f64 {
        *self.c4.get_or_init(|| primitives::c4(self.n))
    }

    pub fn c5(&self) -> f64 {
        self.deviation().c5
    }

    pub fn d2(&self) -> Result<f64, ConstantError> {
        self.d2
            .get_or_init(|| self.estimator.d2(self.n))
            .clone()
    }

    pub fn d3(&self) -> Result<f64, ConstantError> {
        self.d3
            .get_or_init(|| {
                let d2 = self.d2()?;
                self.estimator.d3_with_d2(self.n, d2)
            })
            .clone()
    }

    // ---------------------------------------------------------------------
    // Derived constants
    // ---------------------------------------------------------------------

    pub fn A(&self) -> f64 {
        self.z() / self.n().sqrt()
    }

    pub fn A2(&self) -> Result<f64, ConstantError> {
        Ok(self.range()?.a2)
    }

    pub fn A3(&self) -> f64 {
        self.deviation().a3
    }

    pub fn B3(&self) -> f64 {
        self.deviation().b3
    }

    pub fn B4(&self) -> f64 {
        self.deviation().b4
    }

    pub fn B5(&self) -> f64 {
        self.deviation().b5
    }

    pub fn B6(&self) -> f64 {
        self.deviation().b6
    }

    pub fn D1(&self) -> Result<f64, ConstantError> {
        Ok(self.range()?.big_d1)
    }

    pub fn D2(&self) -> Result<f64, ConstantError> {
        Ok(self.range()?.big_d2)
    }

    pub fn D3(&self) -> Result<f64, ConstantError> {
        Ok(self.range()?.big_d3)
    }

    pub fn D4(&self) -> Result<f64, ConstantError> {
        Ok(self.range()?.big_d4)
    }

    pub fn E2(&self) -> Result<f64, ConstantError> {
        Ok(self.range()?.e2)
    }

    pub fn E3(&self) -> f64 {
        self.deviation().e3
    }

    fn deviation(&self) -> &DeviationFactors {
        self.deviation.get_or_init(|| {
            let (n, z, c4) = (self.n(), self.z(), self.c4());
            let c5 = primitives::c5_from_c4(c4);
            DeviationFactors {
                c5,
                a3: z / c4 / n.sqrt(),
                b3: (1.0 - (z / c4) * c5).max(0.0),
                b4: 1.0 + (z / c4) * c5,
                b5: (c4 - z * c5).max(0.0),
                b6: c4 + z * c5,
                e3: z / c4,
            }
        })
    }

    fn range(&self) -> Result<RangeFactors, ConstantError> {
        self.range
            .get_or_init(|| {
                let (n, z) = (self.n(), self.z());
                let d2 = self.d2()?;
                let d3 = self.d3()?;
                Ok(RangeFactors {
                    a2: z / d2 / n.sqrt(),
                    big_d1: (d2 - z * d3).max(0.0),
                    big_d2: d2 + z * d3,
                    big_d3: (1.0 - z * d3 / d2).max(0.0),
                    big_d4: 1.0 + z * d3 / d2,
                    e2: z / d2,
                })
            })
            .clone()
    }

    /// Every constant, forcing the range integrals if not yet computed
    pub fn summary(&self) -> Result<ConstantSummary, ConstantError> {
        let range = self.range()?;
        let deviation = *self.deviation();
        Ok(ConstantSummary {
            n: self.n(),
            z: self.z(),
            a: self.A(),
            a2: range.a2,
            a3: deviation.a3,
            c4: self.c4(),
            c5: deviation.c5,
            b3: deviation.b3,
            b4: deviation.b4,
            b5: deviation.b5,
            b6: deviation.b6,
            d2: self.d2()?,
            d3: self.d3()?,
            big_d1: range.big_d1,
            big_d2: range.big_d2,
            big_d3: range.big_d3,
            big_d4: range.big_d4,
            e2: range.e2,
            e3: deviation.e3,
        })
    }
}

impl std::fmt::Display for ConstantSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.summary() {
            Ok(summary) => write!(f, "{}", summary),
            Err(e) => write!(f, "n={} z={} error=\"{}\"", self.n, self.z, e),
        }
    }
}

/// Snapshot of a fully computed constant set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstantSummary {
    pub n: f64,
    pub z: f64,
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "A2")]
    pub a2: f64,
    #[serde(rename = "A3")]
    pub a3: f64,
    pub c4: f64,
    pub c5: f64,
    #[serde(rename = "B3")]
    pub b3: f64,
    #[serde(rename = "B4")]
    pub b4: f64,
    #[serde(rename = "B5")]
    pub b5: f64,
    #[serde(rename = "B6")]
    pub b6: f64,
    pub d2: f64,
    pub d3: f64,
    #[serde(rename = "D1")]
    pub big_d1: f64,
    #[serde(rename = "D2")]
    pub big_d2: f64,
    #[serde(rename = "D3")]
    pub big_d3: f64,
    #[serde(rename = "D4")]
    pub big_d4: f64,
    #[serde(rename = "E2")]
    pub e2: f64,
    #[serde(rename = "E3")]
    pub e3: f64,
}

impl std::fmt::Display for ConstantSummary {
    /// Single-line `key=value` form; field order is parsed by existing tooling
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} z={} A={:.8} A2={:.8} A3={:.8} c4={:.8} B3={:.8} B4={:.8} B5={:.8} \
             B6={:.8} d2={:.8} d3={:.8} D1={:.8} D2={:.8} D3={:.8} D4={:.8}",
            self.n,
            self.z,
            self.a,
            self.a2,
            self.a3,
            self.c4,
            self.b3,
            self.b4,
            self.b5,
            self.b6,
            self.d2,
            self.d3,
            self.big_d1,
            self.big_d2,
            self.big_d3,
            self.big_d4,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::{MemoryCache, RangeCache, Statistic};
    use std::sync::Arc;

    fn approx(a: f64, b: f64, rel: f64) -> bool {
        ((a - b) / b).abs() <= rel
    }

    #[test]
    fn test_construction_rejects_bad_parameters() {
        for (n, z) in [(1.0, 3.0), (0.0, 3.0), (-2.0, 3.0), (2.0, 0.0), (2.0, -1.0)] {
            let err = ConstantSet::new(n, z).unwrap_err();
            assert!(err.is_invalid_parameter(), "({}, {}) accepted", n, z);
        }
    }

    #[test]
    fn test_default_sigma_is_three() {
        let set = ConstantSet::sample_size(5.0).unwrap();
        assert_eq!(set.z(), 3.0);
        assert_eq!(set.n(), 5.0);
    }

    #[test]
    fn test_repr() {
        assert_eq!(ConstantSet::new(2.0, 3.0).unwrap().repr(), "ConstantSet(2, z=3)");
        assert_eq!(
            ConstantSet::new(2.5, 2.75).unwrap().repr(),
            "ConstantSet(2.5, z=2.75)"
        );
    }

    #[test]
    fn test_end_to_end_n2_z3() {
        let set = ConstantSet::new(2.0, 3.0).unwrap();
        assert_eq!(
            set.to_string(),
            "n=2 z=3 A=2.12132034 A2=1.87997121 A3=2.65868078 c4=0.79788456 \
             B3=0.00000000 B4=3.26653192 B5=0.00000000 B6=2.60631539 d2=1.12837917 \
             d3=0.85250247 D1=0.00000000 D2=3.68588657 D3=0.00000000 D4=3.26653192"
        );
        assert_eq!(set.B3(), 0.0);
        assert_eq!(set.B5(), 0.0);
        assert_eq!(set.D1().unwrap(), 0.0);
        assert_eq!(set.D3().unwrap(), 0.0);
    }

    #[test]
    fn test_idempotent_reads() {
        let set = ConstantSet::new(4.0, 3.0).unwrap();
        let first = set.summary().unwrap();
        let second = set.summary().unwrap();
        assert_eq!(first, second);
        assert_eq!(set.d3().unwrap().to_bits(), set.d3().unwrap().to_bits());
        assert_eq!(set.B4().to_bits(), set.B4().to_bits());
    }

    #[test]
    fn test_closed_form_relations() {
        for z in [2.5, 3.0, 3.5] {
            for n in [2.0, 3.0, 5.0, 10.0] {
                let set = ConstantSet::new(n, z).unwrap();
                let d2 = set.d2().unwrap();
                assert!(approx(set.A(), z / n.sqrt(), 1e-12));
                assert!(approx(set.A2().unwrap(), z / (d2 * n.sqrt()), 1e-12));
                assert!(approx(set.A3(), z / (set.c4() * n.sqrt()), 1e-12));
                assert!(approx(set.E2().unwrap(), z / d2, 1e-12));
                assert!(approx(set.E3(), z / set.c4(), 1e-12));
                assert_eq!(set.c5(), (1.0 - set.c4() * set.c4()).sqrt());
            }
        }
    }

    #[test]
    fn test_paired_invariants_when_unclamped() {
        for z in [1.5, 2.0, 3.0] {
            for n in [7.0, 10.0, 25.0] {
                let set = ConstantSet::new(n, z).unwrap();
                let (c4, c5) = (set.c4(), set.c5());
                let (d2, d3) = (set.d2().unwrap(), set.d3().unwrap());

                if set.B3() > 0.0 {
                    assert!(approx(set.B3() + set.B4(), 2.0, 1e-8));
                    assert!(approx((set.B4() - set.B3()) * c4 / c5 / z, 2.0, 1e-8));
                }
                if set.B5() > 0.0 {
                    assert!(approx((set.B5() + set.B6()) / c4, 2.0, 1e-8));
                    assert!(approx((set.B6() - set.B5()) / c5 / z, 2.0, 1e-8));
                }
                let (big_d1, big_d2) = (set.D1().unwrap(), set.D2().unwrap());
                if big_d1 > 0.0 {
                    assert!(approx((big_d1 + big_d2) / d2, 2.0, 1e-8));
                    assert!(approx((big_d2 - big_d1) / z / d3, 2.0, 1e-8));
                }
                let (big_d3, big_d4) = (set.D3().unwrap(), set.D4().unwrap());
                if big_d3 > 0.0 {
                    assert!(approx(big_d3 + big_d4, 2.0, 1e-8));
                    assert!(approx((big_d4 - big_d3) * d2 / d3 / z, 2.0, 1e-8));
                }
            }
        }
    }

    #[test]
    fn test_clamped_lower_limits_break_pair_sum() {
        // n=2: D3 clamps to 0, so D3 + D4 = D4 > 2
        let set = ConstantSet::new(2.0, 3.0).unwrap();
        assert_eq!(set.D3().unwrap(), 0.0);
        assert!(set.D3().unwrap() + set.D4().unwrap() > 2.0);
    }

    #[test]
    fn test_precision_failure_is_lazy_and_memoized() {
        // A d2 far above the true value makes the d3 variance negative
        let cache = Arc::new(MemoryCache::new());
        let n2 = SampleSize::new(2.0).unwrap();
        cache.put(Statistic::D2, n2, 10.0).unwrap();
        let estimator = RangeEstimator::default().with_cache(cache.clone());

        let set = ConstantSet::with_estimator(2.0, 3.0, estimator).unwrap();
        assert!(approx(set.B4(), 3.26653192, 1e-8));
        assert_eq!(set.d2().unwrap(), 10.0);

        for _ in 0..2 {
            let err = set.D4().unwrap_err();
            assert!(err.is_precision(), "{:?}", err);
            assert!(!err.is_invalid_parameter());
        }
        assert_eq!(set.d3().unwrap_err(), set.D4().unwrap_err());
        assert!(set.summary().is_err());
        // Failed d3 is not written back
        assert_eq!(cache.get(Statistic::D3, n2).unwrap(), None);

        let shown = set.to_string();
        assert!(shown.starts_with("n=2 z=3 error=\""), "{}", shown);
        assert!(shown.contains("d3"));
    }

    #[test]
    fn test_shared_cache_across_sets() {
        let cache = Arc::new(MemoryCache::new());
        let estimator = RangeEstimator::default().with_cache(cache.clone());

        let three = ConstantSet::with_estimator(5.0, 3.0, estimator.clone()).unwrap();
        let d3_three = three.d3().unwrap();
        assert_eq!(cache.len(), 2);

        let two = ConstantSet::with_estimator(5.0, 2.0, estimator).unwrap();
        assert_eq!(two.d3().unwrap().to_bits(), d3_three.to_bits());
        assert!(two.D4().unwrap() < three.D4().unwrap());
    }

    #[test]
    fn test_concurrent_first_access() {
        let set = Arc::new(ConstantSet::new(3.0, 3.0).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let set = Arc::clone(&set);
                std::thread::spawn(move || set.D4().unwrap().to_bits())
            })
            .collect();
        let bits: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(bits.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_summary_serializes_with_chart_names() {
        let set = ConstantSet::new(2.0, 3.0).unwrap();
        let json = serde_json::to_value(set.summary().unwrap()).unwrap();
        assert!(json.get("A2").is_some());
        assert!(json.get("D4").is_some());
        assert!(json.get("d3").is_some());
        assert_eq!(json["n"], 2.0);
    }
}
