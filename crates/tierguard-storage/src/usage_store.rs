//! UsageStore: durable usage counters with lazy window resets.
//!
//! Every mutation holds `write_lock` across read-document, mutate, write-document.
//! Reads take no lock; they apply due resets to their own copy only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tierguard_core::catalog::TierDefinition;
use tierguard_core::clock::Clock;
use tierguard_core::config::LifecycleConfig;
use tierguard_core::constants::{DEFAULT_GRACE_REPLENISH_DAYS, DEFAULT_QUERY_OVERAGE_ALLOWANCE};
use tierguard_core::errors::StorageError;
use tierguard_core::models::{
    FeatureFlag, GraceOutcome, LimitBreach, QueryLimitCheck, QuotaDecision, QuotaWindow,
    RemainingQuota, Tier, TierHistoryEntry, UpgradeSignals, ViolationAction, ViolationRecord,
    ViolationType,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::analytics;
use crate::document::{FeatureFlags, LicenseValidationRecord, UploadEntry, UsageDocument};
use crate::json_file::{read_json, write_json_atomic};
use crate::migrations::{self, MigrationContext};

/// Grace allowance settings.
#[derive(Debug, Clone, Copy)]
pub struct UsageStoreOptions {
    pub query_overage_allowance: u32,
    pub grace_replenish_days: i64,
}

impl Default for UsageStoreOptions {
    fn default() -> Self {
        Self {
            query_overage_allowance: DEFAULT_QUERY_OVERAGE_ALLOWANCE,
            grace_replenish_days: DEFAULT_GRACE_REPLENISH_DAYS,
        }
    }
}

impl From<&LifecycleConfig> for UsageStoreOptions {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            query_overage_allowance: config.query_overage_allowance,
            grace_replenish_days: config.grace_replenish_days,
        }
    }
}

#[derive(Debug)]
pub struct UsageStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    options: UsageStoreOptions,
    write_lock: Mutex<()>,
}

impl UsageStore {
    /// Open the store at `path`. An existing file is read and migrated up front
    /// so that corruption or an unsupported version fails here, not mid-operation.
    pub async fn open(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        options: UsageStoreOptions,
    ) -> Result<Self, StorageError> {
        let store = Self {
            path: path.into(),
            clock,
            options,
            write_lock: Mutex::new(()),
        };
        let document = store.load_document(store.clock.now()).await?;
        debug!(
            path = %store.path.display(),
            schema_version = document.schema_version,
            "usage store opened"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- queries ----

    /// Count one query against both windows.
    pub async fn record_query(&self, tier: Tier) -> Result<(), StorageError> {
        self.mutate(|doc, now| {
            doc.usage.queries.monthly.record(now, tier);
            doc.usage.queries.daily.record(now, tier);
        })
        .await
    }

    /// Check current counts against `limits`. Monthly first. `-1` always passes.
    pub async fn check_query_limit(
        &self,
        limits: &TierDefinition,
    ) -> Result<QueryLimitCheck, StorageError> {
        self.read(|doc, _| match query_breach(doc, limits) {
            Some(breach) => QueryLimitCheck {
                decision: QuotaDecision::deny(breach.denial_reason()),
                breach: Some(breach),
            },
            None => QueryLimitCheck {
                decision: QuotaDecision::allow(),
                breach: None,
            },
        })
        .await
    }

    /// Remaining queries per window. `-1` when unlimited, otherwise never negative.
    pub async fn get_remaining(&self, limits: &TierDefinition) -> Result<RemainingQuota, StorageError> {
        self.read(|doc, _| {
            let queries = &doc.usage.queries;
            let remaining = |limit: i64, used: i64| {
                if TierDefinition::is_unlimited(limit) {
                    -1
                } else {
                    (limit - used).max(0)
                }
            };
            RemainingQuota {
                monthly_remaining: remaining(limits.max_queries_monthly, queries.monthly.count),
                daily_remaining: remaining(limits.max_queries_daily, queries.daily.count),
                monthly_used: queries.monthly.count,
                daily_used: queries.daily.count,
                monthly_reset_date: queries.monthly.reset_date,
                daily_reset_date: queries.daily.reset_date,
            }
        })
        .await
    }

    // ---- documents ----

    pub async fn record_document_upload(
        &self,
        document_id: &str,
        size_mb: f64,
        tier: Tier,
        format: &str,
    ) -> Result<(), StorageError> {
        self.mutate(|doc, now| {
            let documents = &mut doc.usage.documents;
            documents.total_count += 1;
            documents.current_visible += 1;
            documents.upload_history.push(UploadEntry {
                document_id: document_id.to_string(),
                uploaded_at: now,
                size_mb,
                tier,
                format: format.to_string(),
                deleted_at: None,
            });
        })
        .await
    }

    /// Mark a document deleted. Repeating a deletion is a no-op. Ids with no
    /// upload entry (uploads recorded before history existed) still decrement.
    /// Returns whether the visible count changed.
    pub async fn record_document_deletion(&self, document_id: &str) -> Result<bool, StorageError> {
        self.mutate(|doc, now| {
            let documents = &mut doc.usage.documents;
            let mut known = false;
            let mut stamped = false;
            for entry in documents
                .upload_history
                .iter_mut()
                .filter(|u| u.document_id == document_id)
            {
                known = true;
                if entry.is_live() {
                    entry.deleted_at = Some(now);
                    stamped = true;
                    break;
                }
            }
            if known && !stamped {
                return false;
            }
            let before = documents.current_visible;
            documents.current_visible = (documents.current_visible - 1).max(0);
            documents.current_visible != before
        })
        .await
    }

    pub async fn get_document_count(&self) -> Result<i64, StorageError> {
        self.read(|doc, _| doc.usage.documents.current_visible).await
    }

    /// Sum of the sizes of documents not yet deleted.
    pub async fn get_storage_used_mb(&self) -> Result<f64, StorageError> {
        self.read(|doc, _| doc.usage.documents.storage_used_mb()).await
    }

    // ---- enforcement ----

    pub async fn record_violation(
        &self,
        violation_type: ViolationType,
        tier: Tier,
        limit: i64,
        attempted: i64,
        action_taken: ViolationAction,
        grace_used: bool,
    ) -> Result<(), StorageError> {
        self.mutate(|doc, now| {
            doc.usage.enforcement.violations.push(ViolationRecord {
                timestamp: now,
                violation_type,
                tier,
                limit,
                attempted,
                action_taken,
                grace_used,
            });
        })
        .await?;
        debug!(?violation_type, %tier, limit, attempted, ?action_taken, "violation recorded");
        Ok(())
    }

    pub async fn update_grace_periods(
        &self,
        remaining: u32,
        last_reset: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.mutate(|doc, _| {
            let grace = &mut doc.usage.enforcement.grace_periods;
            grace.query_overage_remaining = remaining;
            grace.last_grace_reset = last_reset;
        })
        .await
    }

    pub async fn grace_remaining(&self) -> Result<u32, StorageError> {
        self.read(|doc, _| doc.usage.enforcement.grace_periods.query_overage_remaining)
            .await
    }

    /// Spend one unit of the overage allowance on a query over `limits`, and
    /// record it as a `grace_allowed` violation, in one write.
    ///
    /// The breach is checked again under the write lock: if the window reset
    /// since the caller's check, nothing is spent.
    pub async fn try_consume_grace(
        &self,
        tier: Tier,
        limits: &TierDefinition,
    ) -> Result<GraceOutcome, StorageError> {
        self.mutate_if(|doc, now| {
            let Some(breach) = query_breach(doc, limits) else {
                return (false, GraceOutcome::WithinLimits);
            };
            let grace = &mut doc.usage.enforcement.grace_periods;
            if grace.query_overage_remaining == 0 {
                return (false, GraceOutcome::Exhausted(breach));
            }
            grace.query_overage_remaining -= 1;
            let remaining = grace.query_overage_remaining;
            doc.usage.enforcement.violations.push(ViolationRecord {
                timestamp: now,
                violation_type: ViolationType::from(breach.window),
                tier,
                limit: breach.limit,
                attempted: breach.current,
                action_taken: ViolationAction::GraceAllowed,
                grace_used: true,
            });
            (true, GraceOutcome::Consumed { breach, remaining })
        })
        .await
    }

    /// Violations in the last `days`, optionally only those with `action`.
    pub async fn count_violations_since(
        &self,
        days: i64,
        action: Option<ViolationAction>,
    ) -> Result<usize, StorageError> {
        self.read(|doc, now| {
            doc.usage
                .enforcement
                .count_since(now - Duration::days(days), action)
        })
        .await
    }

    // ---- license ----

    /// Close the open history entry and open a new one for `new`.
    ///
    /// Returns `false` without writing when the history already ends in an
    /// open `new` entry, so a transition retried after a later step failed
    /// records only once.
    pub async fn record_tier_change(
        &self,
        old: Tier,
        new: Tier,
        reason: &str,
        license_key: Option<&str>,
        expiration_date: Option<DateTime<Utc>>,
    ) -> Result<bool, StorageError> {
        self.mutate_if(|doc, now| {
            let license = &mut doc.license;
            let already_recorded = license.current_tier == new
                && license
                    .tier_history
                    .last()
                    .is_some_and(|e| e.is_open() && e.tier == new);
            if already_recorded {
                debug!(tier = %new, "tier change already in history");
                return (false, false);
            }
            for entry in license.tier_history.iter_mut().filter(|e| e.is_open()) {
                entry.end_date = Some(now);
            }
            license.tier_history.push(TierHistoryEntry {
                tier: new,
                start_date: now,
                end_date: None,
                reason: reason.to_string(),
                license_key: license_key.map(str::to_string),
                expiration_date,
            });
            if license.current_tier != old {
                warn!(
                    recorded = %license.current_tier,
                    expected = %old,
                    "tier history was out of step with the subscription"
                );
            }
            license.current_tier = new;
            (true, true)
        })
        .await
    }

    pub async fn record_license_validation(
        &self,
        license_id: &str,
        tier: Tier,
        algorithm: &str,
    ) -> Result<(), StorageError> {
        self.mutate(|doc, now| {
            doc.license.validation = Some(LicenseValidationRecord {
                last_validated_at: now,
                license_id: license_id.to_string(),
                tier,
                algorithm: algorithm.to_string(),
            });
        })
        .await
    }

    pub async fn tier_history(&self) -> Result<Vec<TierHistoryEntry>, StorageError> {
        self.read(|doc, _| doc.license.tier_history.clone()).await
    }

    // ---- features & analytics ----

    pub async fn record_feature_usage(&self, flag: FeatureFlag) -> Result<(), StorageError> {
        self.mutate_if(|doc, _| {
            let changed = !doc.usage.features.is_set(flag);
            doc.usage.features.set(flag);
            (changed, ())
        })
        .await
    }

    pub async fn feature_flags(&self) -> Result<FeatureFlags, StorageError> {
        self.read(|doc, _| doc.usage.features).await
    }

    /// Compute upgrade signals and persist them under `analytics`.
    pub async fn calculate_upgrade_signals(&self) -> Result<UpgradeSignals, StorageError> {
        self.mutate(|doc, now| {
            let signals = analytics::upgrade_signals(doc, now);
            doc.analytics.tier_upgrade_signals = Some(signals.clone());
            signals
        })
        .await
    }

    /// Post-reset copy of the whole document. Nothing is written.
    pub async fn snapshot(&self) -> Result<UsageDocument, StorageError> {
        self.read(|doc, _| doc.clone()).await
    }

    // ---- internals ----

    /// Load the document, migrating older layouts. A missing file yields a
    /// fresh document; anything unreadable is an error and is left on disk.
    async fn load_document(&self, now: DateTime<Utc>) -> Result<UsageDocument, StorageError> {
        let Some(mut raw) = read_json(&self.path).await? else {
            return Ok(UsageDocument::new(now, self.options.query_overage_allowance));
        };
        let ctx = MigrationContext {
            now,
            query_overage_allowance: self.options.query_overage_allowance,
        };
        migrations::migrate(&mut raw, &ctx)?;
        serde_json::from_value(raw).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            details: e.to_string(),
        })
    }

    async fn read<R>(&self, f: impl FnOnce(&UsageDocument, DateTime<Utc>) -> R) -> Result<R, StorageError> {
        let now = self.clock.now();
        let mut document = self.load_document(now).await?;
        document.apply_resets(
            now,
            self.options.query_overage_allowance,
            self.options.grace_replenish_days,
        );
        Ok(f(&document, now))
    }

    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut UsageDocument, DateTime<Utc>) -> R,
    ) -> Result<R, StorageError> {
        self.mutate_if(|doc, now| (true, f(doc, now))).await
    }

    /// Like `mutate`, but `f` reports whether it changed anything. The document
    /// is still written when a due reset changed it.
    async fn mutate_if<R>(
        &self,
        f: impl FnOnce(&mut UsageDocument, DateTime<Utc>) -> (bool, R),
    ) -> Result<R, StorageError> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();
        let mut document = self.load_document(now).await?;
        let reset = document.apply_resets(
            now,
            self.options.query_overage_allowance,
            self.options.grace_replenish_days,
        );
        let (changed, result) = f(&mut document, now);
        if changed || reset {
            write_json_atomic(&self.path, &document).await?;
        }
        Ok(result)
    }
}

/// The first window at or over its limit, monthly before daily.
fn query_breach(doc: &UsageDocument, limits: &TierDefinition) -> Option<LimitBreach> {
    let queries = &doc.usage.queries;
    [
        (QuotaWindow::Monthly, limits.max_queries_monthly, &queries.monthly),
        (QuotaWindow::Daily, limits.max_queries_daily, &queries.daily),
    ]
    .into_iter()
    .find(|(_, limit, counter)| !TierDefinition::is_unlimited(*limit) && counter.count >= *limit)
    .map(|(window, limit, counter)| LimitBreach {
        window,
        limit,
        current: counter.count,
        resets_at: counter.reset_date,
    })
}
