//! Range statistics estimator: d2 and d3
//!
//! For n standard-normal draws with range W:
//!
//! ```text
//! d2(n) = E[W] = ∫ 1 − (1 − Φ(x))^n − Φ(x)^n dx                       over ℝ
//!
//! f(x, y) = 1 − Φ(y)^n − (1 − Φ(x))^n + (Φ(y) − Φ(x))^n,   x ≤ y
//! d3(n) = sd[W] = sqrt( 2 ∫_ℝ ∫_{−∞}^{y} f(x, y) dx dy − d2(n)² )
//! ```
//!
//! The inner bound of d3 is `y`, not +∞: it encodes the x ≤ y ordering of
//! the minimum and maximum. Every outer evaluation runs a fresh inner
//! integration, so d3 costs on the order of 10^4 integrand calls.
//!
//! # References
//!
//! - Tippett, L.H.C. (1925). "On the Extreme Individuals and the Range of
//!   Samples Taken from a Normal Population", *Biometrika* 17, eqs. (3), (10).
//! - SAS/QC documentation, functions D2 and D3

use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::cache::{RangeCache, Statistic};
use crate::core::error::ConstantError;
use crate::core::normal::{cdf, one_minus_pow, sf};
use crate::core::params::SampleSize;
use crate::core::quadrature::{Bounds, Estimate, Quadrature};

/// d2 integrand: probability that x lies between the sample min and max
fn range_integrand(x: f64, n: f64) -> f64 {
    let p = cdf(x);
    let q = sf(x);
    // 1 - Φ^n - (1-Φ)^n
    one_minus_pow(p, q, n) - q.powf(n)
}

/// d3 integrand f(x, y) for x ≤ y
fn joint_integrand(x: f64, y: f64, n: f64) -> f64 {
    let px = cdf(x);
    let qx = sf(x);
    let py = cdf(y);
    // Φ(y) − Φ(x), taken from the upper tail when both points sit above 0
    let between = (if x > 0.0 { qx - sf(y) } else { py - px }).max(0.0);
    // 1 − (1−Φ(x))^n − Φ(y)^n + (Φ(y) − Φ(x))^n
    one_minus_pow(qx, px, n) - py.powf(n) + between.powf(n)
}

/// Work done by the inner integrations of one d3 evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct InnerStats {
    integrations: usize,
    evaluations: usize,
    unconverged: usize,
}

/// Computes d2 and d3 by numerical integration, consulting an optional cache
#[derive(Clone, Default)]
pub struct RangeEstimator {
    quadrature: Quadrature,
    cache: Option<Arc<dyn RangeCache>>,
}

impl std::fmt::Debug for RangeEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeEstimator")
            .field("quadrature", &self.quadrature)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl RangeEstimator {
    pub fn new(quadrature: Quadrature) -> Self {
        Self {
            quadrature,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RangeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    /// Expected relative range d2(n)
    pub fn d2(&self, n: SampleSize) -> Result<f64, ConstantError> {
        self.cached(Statistic::D2, n, || self.integrate_d2(n))
    }

    /// Standard deviation of the relative range d3(n)
    pub fn d3(&self, n: SampleSize) -> Result<f64, ConstantError> {
        let d2 = self.d2(n)?;
        self.d3_with_d2(n, d2)
    }

    /// d3(n) given the d2(n) this estimator produced
    ///
    /// The result is cached under `n` alone, so `d2` must come from
    /// [`RangeEstimator::d2`] on the same estimator.
    pub(crate) fn d3_with_d2(&self, n: SampleSize, d2: f64) -> Result<f64, ConstantError> {
        self.cached(Statistic::D3, n, || self.integrate_d3(n, d2))
    }

    fn integrate_d2(&self, n: SampleSize) -> Result<f64, ConstantError> {
        let size = n.get();
        let est = self
            .quadrature
            .integrate(|x| range_integrand(x, size), Bounds::Whole);
        report("d2", n, &est);

        if !est.value.is_finite() || est.value <= 0.0 {
            return Err(ConstantError::precision(
                "d2",
                format!("integral evaluated to {} for n={}", est.value, n),
            ));
        }
        Ok(est.value)
    }

    /// Outer integral of f(x, y) over x ≤ y, with inner-integration tallies
    fn second_moment(&self, size: f64) -> (Estimate, InnerStats) {
        let quadrature = self.quadrature;
        let stats = Cell::new(InnerStats::default());

        let est = quadrature.integrate(
            |y| {
                let inner = quadrature
                    .integrate(|x| joint_integrand(x, y, size), Bounds::UpperTo(y));
                let mut s = stats.get();
                s.integrations += 1;
                s.evaluations += inner.evaluations;
                if !inner.converged {
                    s.unconverged += 1;
                }
                stats.set(s);
                inner.value
            },
            Bounds::Whole,
        );
        (est, stats.get())
    }

    fn integrate_d3(&self, n: SampleSize, d2: f64) -> Result<f64, ConstantError> {
        let (est, inner) = self.second_moment(n.get());
        report("d3", n, &est);
        if inner.unconverged > 0 {
            warn!(
                n = %n,
                unconverged = inner.unconverged,
                integrations = inner.integrations,
                "d3 inner integrations did not converge; result may be imprecise"
            );
        }
        debug!(
            n = %n,
            inner_integrations = inner.integrations,
            inner_evaluations = inner.evaluations,
            "d3 inner integrations"
        );

        let variance = 2.0 * est.value - d2 * d2;
        if !variance.is_finite() || variance < 0.0 {
            return Err(ConstantError::precision(
                "d3",
                format!(
                    "variance of the range is {:e} for n={} (outer integral {}, d2 {}); \
                     tighten the quadrature tolerance",
                    variance, n, est.value, d2
                ),
            ));
        }
        Ok(variance.sqrt())
    }

    fn cached<F>(
        &self,
        statistic: Statistic,
        n: SampleSize,
        compute: F,
    ) -> Result<f64, ConstantError>
    where
        F: FnOnce() -> Result<f64, ConstantError>,
    {
        let Some(cache) = &self.cache else {
            return compute();
        };

        match cache.get(statistic, n) {
            Ok(Some(value)) => {
                debug!(%statistic, n = %n, value, "range cache hit");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => warn!(%statistic, n = %n, error = %e, "range cache read failed"),
        }

        let value = compute()?;
        if let Err(e) = cache.put(statistic, n, value) {
            warn!(%statistic, n = %n, error = %e, "range cache write failed");
        }
        Ok(value)
    }
}

fn report(statistic: &'static str, n: SampleSize, est: &Estimate) {
    if est.converged {
        debug!(
            statistic,
            n = %n,
            value = est.value,
            abs_error = est.abs_error,
            evaluations = est.evaluations,
            "integrated"
        );
    } else {
        warn!(
            statistic,
            n = %n,
            value = est.value,
            abs_error = est.abs_error,
            "integration did not converge; result may be imprecise"
        );
    }
}
