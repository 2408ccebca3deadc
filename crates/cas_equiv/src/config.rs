//! Engine configuration, loaded from TOML.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```toml
//! tolerance = 1e-6
//!
//! [oracle]
//! model = "gpt-4o-mini"
//! max_retries = 3
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Longest per-attempt oracle timeout accepted, one hour.
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivConfig {
    /// Relative tolerance for every numeric comparison
    pub tolerance: f64,
    /// Pairs compared concurrently by the equivalence matrix
    pub matrix_concurrency: usize,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Per-attempt timeout
    pub timeout_secs: f64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff step; attempt n waits n * backoff_ms
    pub backoff_ms: u64,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
}

impl Default for EquivConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            matrix_concurrency: 4,
            oracle: OracleConfig::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 8.0,
            max_retries: 2,
            backoff_ms: 250,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "CAS_EQUIV_API_KEY".to_string(),
            temperature: 1.0,
        }
    }
}

impl OracleConfig {
    /// Per-attempt timeout, clamped to [`MAX_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs.min(MAX_TIMEOUT_SECS))
            .unwrap_or(Duration::from_secs(MAX_TIMEOUT_SECS as u64))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl EquivConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> String {
        // Plain structs of scalars always serialize
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 || self.tolerance >= 1.0 {
            return Err(ConfigError::Invalid {
                field: "tolerance",
                reason: format!("expected 0 <= tolerance < 1, got {}", self.tolerance),
            });
        }
        if self.matrix_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "matrix_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        let oracle = &self.oracle;
        if !oracle.timeout_secs.is_finite()
            || oracle.timeout_secs <= 0.0
            || oracle.timeout_secs > MAX_TIMEOUT_SECS
        {
            return Err(ConfigError::Invalid {
                field: "oracle.timeout_secs",
                reason: format!(
                    "expected 0 < timeout_secs <= {}, got {}",
                    MAX_TIMEOUT_SECS, oracle.timeout_secs
                ),
            });
        }
        if !(0.0..=2.0).contains(&oracle.temperature) {
            return Err(ConfigError::Invalid {
                field: "oracle.temperature",
                reason: format!("expected 0 <= temperature <= 2, got {}", oracle.temperature),
            });
        }
        if oracle.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "oracle.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
