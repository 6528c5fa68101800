//! Migration runner for `usage.json`: forward-only, additive, one version at a time.
//!
//! Migrations work on the raw JSON value so that documents written by older
//! builds can be read before the typed layout applies. A document without
//! `schema_version` predates versioning and has the v1 layout.

mod v001_baseline;
mod v002_enforcement;
mod v003_features_analytics;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tierguard_core::errors::StorageError;
use tracing::{debug, info};

/// Latest `usage.json` schema version.
pub const LATEST_VERSION: u32 = 3;

/// Values a migration may need to fill in new sections.
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext {
    pub now: DateTime<Utc>,
    pub query_overage_allowance: u32,
}

type MigrationFn = fn(&mut Map<String, Value>, &MigrationContext) -> Result<(), String>;

const MIGRATIONS: [(u32, &str, MigrationFn); 3] = [
    (1, "baseline", v001_baseline::migrate),
    (2, "enforcement", v002_enforcement::migrate),
    (3, "features_analytics", v003_features_analytics::migrate),
];

/// Stored version of a raw document. `0` when the field is absent.
pub fn stored_version(document: &Value) -> Result<u32, StorageError> {
    match document.get("schema_version") {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StorageError::MigrationFailed {
                version: LATEST_VERSION,
                message: format!("schema_version is not a version number: {v}"),
            }),
    }
}

/// Bring a raw document up to [`LATEST_VERSION`]. Returns the number of
/// migrations applied.
pub fn migrate(document: &mut Value, ctx: &MigrationContext) -> Result<u32, StorageError> {
    let current = stored_version(document)?;
    if current > LATEST_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: current,
            latest: LATEST_VERSION,
        });
    }

    let root = document
        .as_object_mut()
        .ok_or_else(|| StorageError::MigrationFailed {
            version: current.max(1),
            message: "document root is not an object".to_string(),
        })?;

    // Unversioned documents are v1-shaped; the baseline only fills gaps.
    let start = if current == 0 { 1 } else { current + 1 };
    let mut applied = 0;
    for &(version, name, migrate_fn) in MIGRATIONS.iter() {
        if version < start {
            continue;
        }
        migrate_fn(root, ctx).map_err(|message| StorageError::MigrationFailed { version, message })?;
        debug!(version, name, "applied usage migration");
        applied += 1;
    }

    root.insert("schema_version".to_string(), Value::from(LATEST_VERSION));
    if applied > 0 {
        info!(from = current, to = LATEST_VERSION, applied, "usage document migrated");
    }
    Ok(applied)
}

/// Object at `parent[key]`, created when absent or null.
pub(crate) fn object_mut<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>, String> {
    let entry = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => Ok(map),
        other => Err(format!("`{key}` must be an object, found {other}")),
    }
}

pub(crate) fn insert_missing(map: &mut Map<String, Value>, key: &str, value: Value) {
    map.entry(key.to_string()).or_insert(value);
}
