//! Shared helper functions for CLI commands

use miette::Result;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::GlobalOpts;
use crate::core::{
    Config, ConstantSet, MemoryCache, Quadrature, RangeCache, RangeEstimator, SampleSize,
    SigmaLimit, SqliteCache,
};

/// Install the tracing subscriber; `RUST_LOG` wins over `-v`
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load configuration and apply command-line overrides
pub fn resolve_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    if global.no_cache {
        config.cache.enabled = false;
    }
    if let Some(path) = &global.cache_path {
        config.cache.path = Some(path.clone());
    }
    config
}

/// Open the configured cache database
pub fn open_cache(config: &Config) -> Result<SqliteCache> {
    let path = config.cache_path();
    SqliteCache::open(&path)
        .map_err(|e| miette::miette!("Cannot open cache {}: {}", path.display(), e))
}

/// Build the range estimator, backed by the durable cache when enabled
///
/// An unopenable cache file degrades to an in-memory cache.
pub fn build_estimator(config: &Config) -> Result<RangeEstimator> {
    let quadrature = Quadrature::new(config.quadrature).map_err(|e| miette::miette!("{}", e))?;

    let cache: Arc<dyn RangeCache> = if config.cache.enabled {
        match open_cache(config) {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                warn!(error = %e, "falling back to in-memory cache");
                Arc::new(MemoryCache::new())
            }
        }
    } else {
        Arc::new(MemoryCache::new())
    };

    Ok(RangeEstimator::new(quadrature).with_cache(cache))
}

/// Sigma from the command line, or the configured default
pub fn resolve_sigma(arg: Option<f64>, config: &Config) -> Result<SigmaLimit> {
    SigmaLimit::new(arg.unwrap_or(config.sigma)).map_err(|e| miette::miette!("{}", e))
}

/// Validated constant set for `n`
pub fn constant_set(n: f64, z: SigmaLimit, estimator: &RangeEstimator) -> Result<ConstantSet> {
    let n = SampleSize::new(n).map_err(|e| miette::miette!("{}", e))?;
    Ok(ConstantSet::from_parts(n, z, estimator.clone()))
}
