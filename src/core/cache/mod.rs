//! Range-statistics cache
//!
//! d2 and d3 depend only on the sample size and cost one and two nested
//! adaptive integrations respectively. A [`RangeCache`] sits in front of the
//! estimator so repeated constant sets for the same `n` skip the work.
//! Caching is an optimization only: a miss, a failure, or no cache at all
//! gives the same values.
//!
//! Two backends are provided:
//! - [`MemoryCache`]: process-local map, the default
//! - [`SqliteCache`]: durable store shared between runs and processes

mod serialize;
mod sqlite;


use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::error::CacheError;
use crate::core::params::SampleSize;

pub use sqlite::{CacheEntry, SqliteCache};

/// Quantity stored in a range cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Expected relative range
    D2,
    /// Standard deviation of the relative range
    D3,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::D2 => "d2",
            Statistic::D3 => "d3",
        }
    }
}

/// Key/value store for expensive range statistics, keyed by sample size
///
/// Implementations must tolerate concurrent writers of the same key: both
/// write the same value, so last-writer-wins is correct.
pub trait RangeCache: Send + Sync {
    fn get(&self, statistic: Statistic, n: SampleSize) -> Result<Option<f64>, CacheError>;

    fn put(&self, statistic: Statistic, n: SampleSize, value: f64) -> Result<(), CacheError>;
}

/// In-memory cache keyed by statistic and canonical sample-size text
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(Statistic, String), f64>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RangeCache for MemoryCache {
    fn get(&self, statistic: Statistic, n: SampleSize) -> Result<Option<f64>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(&(statistic, n.key())).copied())
    }

    fn put(&self, statistic: Statistic, n: SampleSize, value: f64) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert((statistic, n.key()), value);
        Ok(())
    }
}

/// Decimal text encoding of a cached value; `{:?}` round-trips f64 exactly
pub(crate) fn encode_value(value: f64) -> String {
    format!("{:?}", value)
}

pub(crate) fn decode_value(key: &str, text: &str) -> Result<f64, CacheError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CacheError::Corrupt {
            key: key.to_string(),
            value: text.to_string(),
        })
}
