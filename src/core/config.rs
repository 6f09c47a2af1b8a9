//! Configuration management
//!
//! Layers, lowest priority first:
//! 1. Built-in defaults
//! 2. User config file (`config.yaml` in the platform config directory, or `SPCC_CONFIG`)
//! 3. Environment (`SPCC_SIGMA`, `SPCC_CACHE_PATH`, `SPCC_NO_CACHE`)
//! 4. Command-line flags, applied by the CLI

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::params::DEFAULT_SIGMA;
use crate::core::quadrature::QuadratureConfig;

const CONFIG_FILE: &str = "config.yaml";
const CACHE_FILE: &str = "range_cache.db";

/// Errors reading a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Yaml { path: PathBuf, message: String },
}

/// Durable cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist d2/d3 between runs
    pub enabled: bool,

    /// Cache database file (default: platform cache directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default sigma multiplier when none is given on the command line
    pub sigma: f64,

    /// Integration tolerances for d2 and d3; clear the durable cache after
    /// changing them, since cached values are keyed by sample size only
    pub quadrature: QuadratureConfig,

    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            quadrature: QuadratureConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from all layers; unreadable layers fall back to defaults
    pub fn load() -> Self {
        let path = std::env::var_os("SPCC_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::global_config_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring config file");
                Self::default()
            }),
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a single config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yml::from_str(&contents).map_err(|e| ConfigError::Yaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `SPCC_*` overrides through `lookup` (the process environment in `load`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(sigma) = lookup("SPCC_SIGMA") {
            match sigma.trim().parse::<f64>() {
                Ok(z) => self.sigma = z,
                Err(_) => warn!(value = %sigma, "ignoring unparsable SPCC_SIGMA"),
            }
        }
        if let Some(path) = lookup("SPCC_CACHE_PATH").filter(|p| !p.trim().is_empty()) {
            self.cache.path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("SPCC_NO_CACHE") {
            let flag = flag.trim().to_ascii_lowercase();
            if !(flag.is_empty() || flag == "0" || flag == "false") {
                self.cache.enabled = false;
            }
        }
    }

    /// Effective cache file location
    pub fn cache_path(&self) -> PathBuf {
        if let Some(path) = &self.cache.path {
            return path.clone();
        }
        match Self::project_dirs() {
            Some(dirs) => dirs.cache_dir().join(CACHE_FILE),
            None => PathBuf::from(".spcc").join(CACHE_FILE),
        }
    }

    /// Path of the user-level config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "spcc")
    }
}
