//! v2: license validation stamp, violations and the grace allowance.

use serde_json::{json, Map, Value};

use super::{insert_missing, object_mut, MigrationContext};

pub fn migrate(root: &mut Map<String, Value>, ctx: &MigrationContext) -> Result<(), String> {
    let license = object_mut(root, "license")?;
    insert_missing(license, "validation", Value::Null);

    let usage = object_mut(root, "usage")?;
    let enforcement = object_mut(usage, "enforcement")?;
    insert_missing(enforcement, "violations", json!([]));
    let grace = object_mut(enforcement, "grace_periods")?;
    insert_missing(grace, "query_overage_remaining", json!(ctx.query_overage_allowance));
    insert_missing(grace, "last_grace_reset", json!(ctx.now));
    Ok(())
}
