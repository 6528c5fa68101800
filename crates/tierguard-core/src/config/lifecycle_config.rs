//! Tier lifecycle and grace allowance settings.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_GRACE_REPLENISH_DAYS, DEFAULT_QUERY_OVERAGE_ALLOWANCE,
    DEFAULT_RETAINED_DOCUMENTS, DEFAULT_TRIAL_DAYS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub trial_days: i64,
    pub grace_period_days: i64,
    /// Earliest documents kept when paid_limited lapses to free.
    pub retained_documents: usize,
    /// Extra queries granted past a quota per replenish period.
    pub query_overage_allowance: u32,
    pub grace_replenish_days: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            trial_days: DEFAULT_TRIAL_DAYS,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            retained_documents: DEFAULT_RETAINED_DOCUMENTS,
            query_overage_allowance: DEFAULT_QUERY_OVERAGE_ALLOWANCE,
            grace_replenish_days: DEFAULT_GRACE_REPLENISH_DAYS,
        }
    }
}
