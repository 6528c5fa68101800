//! SubscriptionStore: the persisted subscription record.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tierguard_core::errors::StorageError;
use tierguard_core::models::{ApiKeyMode, Subscription};
use tokio::sync::Mutex;
use tracing::debug;

use crate::json_file::{read_json, write_json_atomic};

/// Latest `subscription.json` schema version.
pub const SUBSCRIPTION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionSettings {
    pub api_key_mode: ApiKeyMode,
}

/// `{schema_version, subscription, settings}` as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub subscription: Subscription,
    #[serde(default)]
    pub settings: SubscriptionSettings,
}

fn default_schema_version() -> u32 {
    SUBSCRIPTION_SCHEMA_VERSION
}

impl Default for SubscriptionRecord {
    fn default() -> Self {
        Self {
            schema_version: SUBSCRIPTION_SCHEMA_VERSION,
            subscription: Subscription::new_trial(),
            settings: SubscriptionSettings::default(),
        }
    }
}

#[derive(Debug)]
pub struct SubscriptionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SubscriptionStore {
    /// Open the store, failing early on a corrupt or too-new file.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        let record = store.load().await?;
        debug!(
            path = %store.path.display(),
            tier = %record.subscription.tier,
            "subscription store opened"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current record. A missing file yields a never-touched trial.
    pub async fn load(&self) -> Result<SubscriptionRecord, StorageError> {
        let Some(raw) = read_json(&self.path).await? else {
            return Ok(SubscriptionRecord::default());
        };
        let record: SubscriptionRecord =
            serde_json::from_value(raw).map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                details: e.to_string(),
            })?;
        if record.schema_version > SUBSCRIPTION_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: record.schema_version,
                latest: SUBSCRIPTION_SCHEMA_VERSION,
            });
        }
        Ok(record)
    }

    /// Read-modify-write under the store lock. `f` returns whether it changed
    /// the record; unchanged records are not rewritten.
    pub async fn update<R>(
        &self,
        f: impl FnOnce(&mut SubscriptionRecord) -> (bool, R),
    ) -> Result<R, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.load().await?;
        let (changed, result) = f(&mut record);
        if changed {
            record.schema_version = SUBSCRIPTION_SCHEMA_VERSION;
            write_json_atomic(&self.path, &record).await?;
        }
        Ok(result)
    }
}
