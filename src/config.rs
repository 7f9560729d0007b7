//! Engine configuration
//!
//! Read from YAML; every key is optional and falls back to its default.
//!
//! ```yaml
//! storage:
//!   data_path: ./corpusgraph_data
//! compute:
//!   pagerank_iterations: 20
//!   betweenness_samples: 200
//!   sample_seed: 42
//! query:
//!   default_window_days: 7
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// RocksDB directory
    pub data_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: "./corpusgraph_data".to_string(),
        }
    }
}

/// Batch computation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub pagerank_iterations: u32,
    pub damping_factor: f64,
    /// Stop early once the L1 change of an iteration drops below this.
    /// `None` runs exactly `pagerank_iterations`.
    pub pagerank_tolerance: Option<f64>,
    pub betweenness_samples: u32,
    /// Fixed seed for source sampling; `None` draws from entropy
    pub sample_seed: Option<u64>,
    pub max_label_passes: u32,
    /// Use the rayon pool for PageRank and betweenness
    pub parallel: bool,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            pagerank_iterations: 20,
            damping_factor: 0.85,
            pagerank_tolerance: None,
            betweenness_samples: 200,
            sample_seed: None,
            max_label_passes: 20,
            parallel: true,
        }
    }
}

/// On-demand query defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_max_depth: usize,
    pub default_window_days: u32,
    pub default_max_results: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 6,
            default_window_days: 7,
            default_max_results: 50,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub compute: ComputeConfig,
    pub query: QueryConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        let c = &self.compute;
        if !(c.damping_factor > 0.0 && c.damping_factor < 1.0) {
            return Err(invalid("compute.damping_factor", "must be in (0, 1)"));
        }
        if c.pagerank_iterations == 0 {
            return Err(invalid("compute.pagerank_iterations", "must be at least 1"));
        }
        if c.betweenness_samples == 0 {
            return Err(invalid("compute.betweenness_samples", "must be at least 1"));
        }
        if let Some(tol) = c.pagerank_tolerance {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(invalid("compute.pagerank_tolerance", "must be positive"));
            }
        }
        if self.query.default_window_days == 0 {
            return Err(invalid("query.default_window_days", "must be at least 1"));
        }
        if self.storage.data_path.trim().is_empty() {
            return Err(invalid("storage.data_path", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.compute.pagerank_iterations, 20);
        assert_eq!(config.compute.betweenness_samples, 200);
        assert_eq!(config.compute.damping_factor, 0.85);
        assert_eq!(config.query.default_max_depth, 6);
        assert_eq!(config.query.default_window_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = EngineConfig::from_yaml_str(
            "compute:\n  betweenness_samples: 50\n  sample_seed: 7\nstorage:\n  data_path: /tmp/cg\n",
        )
        .unwrap();
        assert_eq!(config.compute.betweenness_samples, 50);
        assert_eq!(config.compute.sample_seed, Some(7));
        assert_eq!(config.compute.pagerank_iterations, 20);
        assert_eq!(config.storage.data_path, "/tmp/cg");
        assert_eq!(config.query, QueryConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_rejects_bad_damping() {
        let err = EngineConfig::from_yaml_str("compute:\n  damping_factor: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "compute.damping_factor", .. }));
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = EngineConfig::from_yaml_str("query:\n  default_window_days: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            EngineConfig::from_yaml_str("compute: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
