//! Runtime configuration
//!
//! Loaded once at startup from a JSON file. Every optional field has a
//! conservative default; ambiguous major-only resolution is off unless asked for.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::LogFormat;
use crate::registry::ResolverConfig;
use crate::schema::{SchemaCacheConfig, DEFAULT_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Catalog of policy versions registered at startup (required)
    pub catalog_path: PathBuf,

    /// Directory holding `<policy>.json` schema files (required)
    pub schema_dir: PathBuf,

    /// Resolve major-only version specs (default: false)
    #[serde(default)]
    pub ambiguous_major_resolution: bool,

    /// Maximum compiled schemas kept in memory (default: 100)
    #[serde(default = "default_schema_cache_capacity")]
    pub schema_cache_capacity: usize,

    /// Log filter directive (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_schema_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RuntimeConfig {
    /// Load configuration from file.
    ///
    /// Relative `catalog_path` and `schema_dir` are resolved against the
    /// directory containing the config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: RuntimeConfig = serde_json::from_str(&content)?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.catalog_path = base.join(&config.catalog_path);
            config.schema_dir = base.join(&config.schema_dir);
        }
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.schema_cache_capacity == 0 {
            return Err(ConfigError::Invalid("schema_cache_capacity must be > 0".into()));
        }
        if self.catalog_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("catalog_path is required".into()));
        }
        if self.schema_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("schema_dir is required".into()));
        }
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            ambiguous_major_resolution: self.ambiguous_major_resolution,
        }
    }

    pub fn schema_cache_config(&self) -> SchemaCacheConfig {
        SchemaCacheConfig {
            capacity: self.schema_cache_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("policy-resolver.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, r#"{"catalog_path":"catalog.json","schema_dir":"schemas"}"#);

        let config = RuntimeConfig::load(&path).unwrap();
        assert!(!config.ambiguous_major_resolution);
        assert!(!config.resolver_config().ambiguous_major_resolution);
        assert_eq!(config.schema_cache_capacity, 100);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.schema_dir, temp_dir.path().join("schemas"));
    }

    #[test]
    fn test_flag_and_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"{"catalog_path":"c.json","schema_dir":"s","ambiguous_major_resolution":true,"schema_cache_capacity":5,"log_format":"json"}"#,
        );

        let config = RuntimeConfig::load(&path).unwrap();
        assert!(config.resolver_config().ambiguous_major_resolution);
        assert_eq!(config.schema_cache_config().capacity, 5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"{"catalog_path":"c.json","schema_dir":"s","schema_cache_capacity":0}"#,
        );

        assert!(matches!(RuntimeConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, r#"{"schema_dir":"s"}"#);

        assert!(matches!(RuntimeConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = RuntimeConfig::load(&temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
