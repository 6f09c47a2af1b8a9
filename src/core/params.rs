//! Parameter validation for sample size and sigma limit
//!
//! Both values are checked once, at construction, and are immutable
//! afterwards. Fractional sample sizes are allowed: the integrals and the
//! gamma ratio are defined for any real n >= 2.

use serde::{Deserialize, Serialize};

use crate::core::error::ConstantError;

/// Default sigma multiplier (3-sigma control limits)
pub const DEFAULT_SIGMA: f64 = 3.0;

/// Subgroup size `n`, guaranteed finite and >= 2
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SampleSize(f64);

impl SampleSize {
    pub fn new(n: f64) -> Result<Self, ConstantError> {
        if !n.is_finite() {
            return Err(ConstantError::invalid(
                "n",
                format!("sample size must be a finite number, not {}", n),
            ));
        }
        if n < 2.0 {
            return Err(ConstantError::invalid(
                "n",
                format!("sample size must be greater than or equal to 2, not {}", n),
            ));
        }
        Ok(Self(n))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Canonical text form used as a cache key: `2`, `2.5`, `10`
    pub fn key(self) -> String {
        format!("{}", self.0)
    }
}

impl std::fmt::Display for SampleSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for SampleSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = f64::deserialize(deserializer)?;
        SampleSize::new(n).map_err(serde::de::Error::custom)
    }
}

/// Sigma multiplier `z`, guaranteed finite and > 0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SigmaLimit(f64);

impl SigmaLimit {
    pub fn new(z: f64) -> Result<Self, ConstantError> {
        if !z.is_finite() || z <= 0.0 {
            return Err(ConstantError::invalid(
                "z",
                format!("sigma limit must be positive, not {}", z),
            ));
        }
        Ok(Self(z))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for SigmaLimit {
    fn default() -> Self {
        Self(DEFAULT_SIGMA)
    }
}

impl std::fmt::Display for SigmaLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for SigmaLimit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let z = f64::deserialize(deserializer)?;
        SigmaLimit::new(z).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_size_accepts_two_and_fractions() {
        assert_eq!(SampleSize::new(2.0).unwrap().get(), 2.0);
        assert_eq!(SampleSize::new(2.5).unwrap().get(), 2.5);
        assert_eq!(SampleSize::new(1000.0).unwrap().get(), 1000.0);
    }

    #[test]
    fn test_sample_size_rejects_below_two() {
        for n in [1.0, 1.999, 0.0, -3.0] {
            let err = SampleSize::new(n).unwrap_err();
            assert!(err.is_invalid_parameter(), "n={} should be rejected", n);
        }
    }

    #[test]
    fn test_sample_size_rejects_non_finite() {
        assert!(SampleSize::new(f64::NAN).is_err());
        assert!(SampleSize::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_sample_size_key() {
        assert_eq!(SampleSize::new(2.0).unwrap().key(), "2");
        assert_eq!(SampleSize::new(2.5).unwrap().key(), "2.5");
        assert_eq!(SampleSize::new(25.0).unwrap().key(), "25");
    }

    #[test]
    fn test_sigma_limit() {
        assert_eq!(SigmaLimit::default().get(), 3.0);
        assert_eq!(SigmaLimit::new(0.5).unwrap().get(), 0.5);
        assert!(SigmaLimit::new(0.0).unwrap_err().is_invalid_parameter());
        assert!(SigmaLimit::new(-1.0).unwrap_err().is_invalid_parameter());
        assert!(SigmaLimit::new(f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let n: SampleSize = serde_json::from_str("4").unwrap();
        assert_eq!(n.get(), 4.0);
        assert!(serde_json::from_str::<SampleSize>("1").is_err());
        assert!(serde_json::from_str::<SigmaLimit>("0").is_err());
    }
}
