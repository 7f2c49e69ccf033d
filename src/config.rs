//! Configuration types for Valve

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Result, ValveError};

/// API front-end tunables
///
/// Deserialized from the server's TOML configuration. `requests_max = 0`
/// selects automatic sizing from total system memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Maximum in-flight requests across the cluster (0 = auto-size)
    #[serde(default)]
    pub requests_max: usize,
    /// Max wait for a capacity token before rejecting, in milliseconds
    #[serde(default = "default_requests_deadline_ms")]
    pub requests_deadline_ms: u64,
    /// Deadline for cluster-internal calls, in milliseconds (0 = use default)
    #[serde(default)]
    pub cluster_deadline_ms: u64,
    /// Minimum storage nodes required for list operations
    #[serde(default)]
    pub list_quorum: usize,
    /// Extra lifetime granted to in-progress list results, in milliseconds
    #[serde(default)]
    pub extend_list_life_ms: u64,
    /// Origins allowed by the CORS layer
    #[serde(default)]
    pub cors_allow_origin: Vec<String>,
}

fn default_requests_deadline_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            requests_max: 0,
            requests_deadline_ms: default_requests_deadline_ms(),
            cluster_deadline_ms: 0,
            list_quorum: 0,
            extend_list_life_ms: 0,
            cors_allow_origin: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValveError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ValveError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.requests_deadline_ms == 0 {
            return Err(ValveError::ConfigError(
                "requests_deadline_ms must be > 0".to_string(),
            ));
        }

        for (i, origin) in self.cors_allow_origin.iter().enumerate() {
            if origin.is_empty() {
                return Err(ValveError::ConfigError(format!(
                    "cors_allow_origin {i}: origin cannot be empty"
                )));
            }
        }

        Ok(())
    }

    /// Max wait for a capacity token
    #[must_use]
    pub fn requests_deadline(&self) -> Duration {
        Duration::from_millis(self.requests_deadline_ms)
    }

    /// Deadline for cluster-internal calls (zero means "use default")
    #[must_use]
    pub fn cluster_deadline(&self) -> Duration {
        Duration::from_millis(self.cluster_deadline_ms)
    }

    /// Extra lifetime granted to in-progress list results
    #[must_use]
    pub fn extend_list_life(&self) -> Duration {
        Duration::from_millis(self.extend_list_life_ms)
    }
}
