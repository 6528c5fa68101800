//! Tier catalog: 4 tiers mapped to their feature limits.
//!
//! Trial: generous limits, bundled API keys, 7 days
//! Free: 3 documents, 50 queries/month, custom API keys only
//! Paid: unlimited documents and queries
//! PaidLimited: reduced limits while a payment problem is resolved

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::models::Tier;

/// Sentinel for "no limit" on any numeric field.
pub const UNLIMITED: i64 = -1;

/// Feature limits for one tier. `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub max_documents: i64,
    pub max_doc_size_mb: i64,
    pub max_total_storage_mb: i64,
    pub max_queries_monthly: i64,
    pub max_queries_daily: i64,
    pub use_default_keys: bool,
}

impl TierDefinition {
    pub fn is_unlimited(limit: i64) -> bool {
        limit == UNLIMITED
    }
}

const TRIAL: TierDefinition = TierDefinition {
    max_documents: 10,
    max_doc_size_mb: 25,
    max_total_storage_mb: 250,
    max_queries_monthly: 300,
    max_queries_daily: 50,
    use_default_keys: true,
};

const FREE: TierDefinition = TierDefinition {
    max_documents: 3,
    max_doc_size_mb: 10,
    max_total_storage_mb: 30,
    max_queries_monthly: 50,
    max_queries_daily: 10,
    use_default_keys: false,
};

const PAID: TierDefinition = TierDefinition {
    max_documents: UNLIMITED,
    max_doc_size_mb: 100,
    max_total_storage_mb: UNLIMITED,
    max_queries_monthly: UNLIMITED,
    max_queries_daily: UNLIMITED,
    use_default_keys: true,
};

const PAID_LIMITED: TierDefinition = TierDefinition {
    max_documents: 10,
    max_doc_size_mb: 25,
    max_total_storage_mb: 250,
    max_queries_monthly: 100,
    max_queries_daily: 20,
    use_default_keys: false,
};

/// Static tier → limits table. Pure, no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierCatalog;

impl TierCatalog {
    /// Limits for a typed tier. Total.
    pub fn features(tier: Tier) -> TierDefinition {
        match tier {
            Tier::Trial => TRIAL,
            Tier::Free => FREE,
            Tier::Paid => PAID,
            Tier::PaidLimited => PAID_LIMITED,
        }
    }

    /// Limits for a tier name. Fails for anything but the four known names.
    pub fn get_features(tier_name: &str) -> Result<TierDefinition, ConfigError> {
        let tier: Tier = tier_name.parse()?;
        Ok(Self::features(tier))
    }
}
