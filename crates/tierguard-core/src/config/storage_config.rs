//! Storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{SUBSCRIPTION_FILE_NAME, USAGE_FILE_NAME};

/// Where the persisted documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding both documents. Created on open.
    pub data_dir: PathBuf,
    pub usage_file: String,
    pub subscription_file: String,
}

impl StorageConfig {
    pub fn usage_path(&self) -> PathBuf {
        self.data_dir.join(&self.usage_file)
    }

    pub fn subscription_path(&self) -> PathBuf {
        self.data_dir.join(&self.subscription_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".tierguard"),
            usage_file: USAGE_FILE_NAME.to_string(),
            subscription_file: SUBSCRIPTION_FILE_NAME.to_string(),
        }
    }
}
