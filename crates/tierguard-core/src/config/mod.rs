pub mod license_config;
pub mod lifecycle_config;
pub mod observability_config;
pub mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use license_config::{LicenseConfig, LicenseEnvironment};
pub use lifecycle_config::LifecycleConfig;
pub use observability_config::{LogFormat, ObservabilityConfig};
pub use storage_config::StorageConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TierguardConfig {
    pub storage: StorageConfig,
    pub license: LicenseConfig,
    pub lifecycle: LifecycleConfig,
    pub observability: ObservabilityConfig,
}

impl TierguardConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
