//! v3: feature-usage flags and the analytics section.

use serde_json::{json, Map, Value};
use tierguard_core::models::FeatureFlag;

use super::{insert_missing, object_mut, MigrationContext};

pub fn migrate(root: &mut Map<String, Value>, _ctx: &MigrationContext) -> Result<(), String> {
    let usage = object_mut(root, "usage")?;
    let features = object_mut(usage, "features")?;
    for flag in FeatureFlag::ALL {
        insert_missing(features, flag.as_str(), json!(false));
    }

    let analytics = object_mut(root, "analytics")?;
    insert_missing(analytics, "tier_upgrade_signals", Value::Null);
    Ok(())
}
