//! v1: license tier + history, query counters, document counters.

use chrono::Duration;
use serde_json::{json, Map, Value};
use tierguard_core::constants::{DAILY_WINDOW_DAYS, MONTHLY_WINDOW_DAYS};

use super::{insert_missing, object_mut, MigrationContext};

pub fn migrate(root: &mut Map<String, Value>, ctx: &MigrationContext) -> Result<(), String> {
    let license = object_mut(root, "license")?;
    insert_missing(license, "current_tier", json!("trial"));
    insert_missing(license, "tier_history", json!([]));
    let current_tier = license.get("current_tier").cloned().unwrap_or(Value::Null);
    let history = license
        .get_mut("tier_history")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| "`license.tier_history` must be an array".to_string())?;
    // Keep exactly one open entry.
    if history.is_empty() {
        history.push(json!({
            "tier": current_tier,
            "start_date": ctx.now,
            "end_date": null,
            "reason": "initial",
        }));
    }

    let usage = object_mut(root, "usage")?;
    let queries = object_mut(usage, "queries")?;
    for (window, days) in [("monthly", MONTHLY_WINDOW_DAYS), ("daily", DAILY_WINDOW_DAYS)] {
        let counter = object_mut(queries, window)?;
        insert_missing(counter, "count", json!(0));
        insert_missing(counter, "reset_date", json!(ctx.now + Duration::days(days)));
        insert_missing(counter, "history", json!([]));
    }

    let documents = object_mut(usage, "documents")?;
    insert_missing(documents, "total_count", json!(0));
    let total = documents.get("total_count").cloned().unwrap_or(json!(0));
    insert_missing(documents, "current_visible", total);
    insert_missing(documents, "upload_history", json!([]));
    Ok(())
}
