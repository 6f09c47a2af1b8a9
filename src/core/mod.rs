//! Core module - constant derivation engine and its collaborators

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod normal;
pub mod params;
pub mod primitives;
pub mod quadrature;
pub mod range;

pub use cache::{CacheEntry, MemoryCache, RangeCache, SqliteCache, Statistic};
pub use config::{CacheConfig, Config, ConfigError};
pub use constants::{ConstantSet, ConstantSummary};
pub use error::{CacheError, ConstantError};
pub use params::{SampleSize, SigmaLimit, DEFAULT_SIGMA};
pub use quadrature::{Bounds, Estimate, Quadrature, QuadratureConfig};
pub use range::RangeEstimator;
