//! Typed layout of `usage.json` at the latest schema version.
//!
//! Older layouts are brought up to this shape by [`crate::migrations`]
//! before deserialization.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tierguard_core::constants::{DAILY_WINDOW_DAYS, MONTHLY_WINDOW_DAYS};
use tierguard_core::models::{
    FeatureFlag, Tier, TierHistoryEntry, UpgradeSignals, ViolationAction, ViolationRecord,
};

use crate::migrations::LATEST_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageDocument {
    pub schema_version: u32,
    pub license: LicenseSection,
    pub usage: UsageSection,
    #[serde(default)]
    pub analytics: AnalyticsSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSection {
    pub current_tier: Tier,
    #[serde(default)]
    pub tier_history: Vec<TierHistoryEntry>,
    #[serde(default)]
    pub validation: Option<LicenseValidationRecord>,
}

/// Last successful license activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseValidationRecord {
    pub last_validated_at: DateTime<Utc>,
    pub license_id: String,
    pub tier: Tier,
    pub algorithm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSection {
    pub queries: QueriesSection,
    pub documents: DocumentsSection,
    pub enforcement: EnforcementSection,
    #[serde(default)]
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueriesSection {
    pub monthly: QueryCounter,
    pub daily: QueryCounter,
}

/// A windowed counter. Reset lazily once `reset_date` has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCounter {
    pub count: i64,
    pub reset_date: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<QueryHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub tier: Tier,
}

impl QueryCounter {
    pub fn new(now: DateTime<Utc>, window_days: i64) -> Self {
        Self {
            count: 0,
            reset_date: now + Duration::days(window_days),
            history: Vec::new(),
        }
    }

    /// Zero the counter if its window has passed. The next window is anchored
    /// at `now`, so skipped windows do not compound. Returns whether it reset.
    pub fn apply_reset(&mut self, now: DateTime<Utc>, window_days: i64) -> bool {
        if now < self.reset_date {
            return false;
        }
        self.count = 0;
        self.history.clear();
        self.reset_date = now + Duration::days(window_days);
        true
    }

    pub fn record(&mut self, now: DateTime<Utc>, tier: Tier) {
        self.count += 1;
        self.history.push(QueryHistoryEntry {
            timestamp: now,
            tier,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsSection {
    pub total_count: i64,
    pub current_visible: i64,
    #[serde(default)]
    pub upload_history: Vec<UploadEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEntry {
    pub document_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_mb: f64,
    pub tier: Tier,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UploadEntry {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

impl DocumentsSection {
    pub fn storage_used_mb(&self) -> f64 {
        self.upload_history
            .iter()
            .filter(|u| u.is_live())
            .map(|u| u.size_mb)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementSection {
    #[serde(default)]
    pub violations: Vec<ViolationRecord>,
    pub grace_periods: GracePeriods,
}

impl EnforcementSection {
    /// Violations at or after `since`, optionally filtered by action.
    pub fn count_since(&self, since: DateTime<Utc>, action: Option<ViolationAction>) -> usize {
        self.violations
            .iter()
            .filter(|v| v.timestamp >= since)
            .filter(|v| action.map_or(true, |a| v.action_taken == a))
            .count()
    }
}

/// Overage allowance for queries past a quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriods {
    pub query_overage_remaining: u32,
    pub last_grace_reset: DateTime<Utc>,
}

impl GracePeriods {
    /// Refill to `allowance` once `replenish_days` have passed since the last refill.
    pub fn apply_replenish(&mut self, now: DateTime<Utc>, allowance: u32, replenish_days: i64) -> bool {
        if now < self.last_grace_reset + Duration::days(replenish_days) {
            return false;
        }
        self.query_overage_remaining = allowance;
        self.last_grace_reset = now;
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub custom_api_keys: bool,
    pub bulk_upload: bool,
    pub advanced_search: bool,
    pub export: bool,
}

impl FeatureFlags {
    pub fn set(&mut self, flag: FeatureFlag) {
        match flag {
            FeatureFlag::CustomApiKeys => self.custom_api_keys = true,
            FeatureFlag::BulkUpload => self.bulk_upload = true,
            FeatureFlag::AdvancedSearch => self.advanced_search = true,
            FeatureFlag::Export => self.export = true,
        }
    }

    pub fn is_set(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::CustomApiKeys => self.custom_api_keys,
            FeatureFlag::BulkUpload => self.bulk_upload,
            FeatureFlag::AdvancedSearch => self.advanced_search,
            FeatureFlag::Export => self.export,
        }
    }

    pub fn any_premium(&self) -> bool {
        FeatureFlag::ALL
            .into_iter()
            .any(|flag| flag.is_premium() && self.is_set(flag))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSection {
    pub tier_upgrade_signals: Option<UpgradeSignals>,
}

impl UsageDocument {
    /// A brand-new document: fresh windows, full grace allowance, one open
    /// trial entry in the tier history.
    pub fn new(now: DateTime<Utc>, query_overage_allowance: u32) -> Self {
        Self {
            schema_version: LATEST_VERSION,
            license: LicenseSection {
                current_tier: Tier::Trial,
                tier_history: vec![TierHistoryEntry {
                    tier: Tier::Trial,
                    start_date: now,
                    end_date: None,
                    reason: "initial".to_string(),
                    license_key: None,
                    expiration_date: None,
                }],
                validation: None,
            },
            usage: UsageSection {
                queries: QueriesSection {
                    monthly: QueryCounter::new(now, MONTHLY_WINDOW_DAYS),
                    daily: QueryCounter::new(now, DAILY_WINDOW_DAYS),
                },
                documents: DocumentsSection {
                    total_count: 0,
                    current_visible: 0,
                    upload_history: Vec::new(),
                },
                enforcement: EnforcementSection {
                    violations: Vec::new(),
                    grace_periods: GracePeriods {
                        query_overage_remaining: query_overage_allowance,
                        last_grace_reset: now,
                    },
                },
                features: FeatureFlags::default(),
            },
            analytics: AnalyticsSection::default(),
        }
    }

    /// Apply every lazy reset due at `now`. Returns whether anything changed.
    pub fn apply_resets(
        &mut self,
        now: DateTime<Utc>,
        query_overage_allowance: u32,
        grace_replenish_days: i64,
    ) -> bool {
        let monthly = self.usage.queries.monthly.apply_reset(now, MONTHLY_WINDOW_DAYS);
        let daily = self.usage.queries.daily.apply_reset(now, DAILY_WINDOW_DAYS);
        let grace = self.usage.enforcement.grace_periods.apply_replenish(
            now,
            query_overage_allowance,
            grace_replenish_days,
        );
        monthly || daily || grace
    }
}
