//! Quota checks and usage recording.
//!
//! Denials are [`QuotaDecision`] values, never errors. Errors here mean the
//! stores could not be read or written.

use std::path::Path;

use tierguard_core::catalog::{TierCatalog, TierDefinition};
use tierguard_core::models::{FeatureFlag, GraceOutcome, QuotaDecision, ViolationAction, ViolationType};
use tierguard_core::TierguardResult;
use tracing::{debug, info};

use crate::manager::SubscriptionManager;
use crate::notify::NotificationSink;
use crate::registry::DocumentRegistry;

impl<N: NotificationSink, D: DocumentRegistry> SubscriptionManager<N, D> {
    /// Whether one more document fits under the tier's document limit.
    /// A denial is recorded as a blocked `document_limit` violation.
    pub async fn check_upload_allowed(&self) -> TierguardResult<QuotaDecision> {
        let tier = self.current_tier().await?;
        let limit = TierCatalog::features(tier).max_documents;
        if TierDefinition::is_unlimited(limit) {
            return Ok(QuotaDecision::allow());
        }

        let count = self.usage.get_document_count().await?;
        if count < limit {
            return Ok(QuotaDecision::allow());
        }

        self.usage
            .record_violation(
                ViolationType::DocumentLimit,
                tier,
                limit,
                count,
                ViolationAction::Blocked,
                false,
            )
            .await?;
        info!(%tier, limit, count, "upload blocked by document limit");
        Ok(QuotaDecision::deny(format!(
            "Document limit reached: {count} of {limit} documents on the {tier} tier. \
             Delete a document or upgrade to add more."
        )))
    }

    /// Whether a document of `size_mb` fits the per-document and total storage
    /// limits. Records no violation.
    pub async fn check_document_size(&self, size_mb: f64) -> TierguardResult<QuotaDecision> {
        let tier = self.current_tier().await?;
        let features = TierCatalog::features(tier);

        if !TierDefinition::is_unlimited(features.max_doc_size_mb)
            && size_mb > features.max_doc_size_mb as f64
        {
            return Ok(QuotaDecision::deny(format!(
                "Document is {size_mb:.1} MB; the {tier} tier allows up to {} MB per document.",
                features.max_doc_size_mb
            )));
        }

        if !TierDefinition::is_unlimited(features.max_total_storage_mb) {
            let used = self.usage.get_storage_used_mb().await?;
            if used + size_mb > features.max_total_storage_mb as f64 {
                return Ok(QuotaDecision::deny(format!(
                    "Not enough storage: {used:.1} of {} MB used on the {tier} tier.",
                    features.max_total_storage_mb
                )));
            }
        }
        Ok(QuotaDecision::allow())
    }

    /// Whether one more query is allowed.
    ///
    /// Past a limit, the overage allowance lets a few extra queries through
    /// (recorded as `grace_allowed`); once it is spent, queries are blocked.
    /// `attempted` in the violation is the count before the rejected query.
    pub async fn check_query_allowed(&self) -> TierguardResult<QuotaDecision> {
        let tier = self.current_tier().await?;
        let features = TierCatalog::features(tier);
        let check = self.usage.check_query_limit(&features).await?;
        if check.breach.is_none() {
            return Ok(check.decision);
        }

        let breach = match self.usage.try_consume_grace(tier, &features).await? {
            GraceOutcome::WithinLimits => {
                debug!(%tier, "query window reset before the overage check");
                return Ok(QuotaDecision::allow());
            }
            GraceOutcome::Consumed { breach, remaining } => {
                info!(%tier, window = breach.window.label(), left = remaining, "query allowed on overage allowance");
                return Ok(QuotaDecision::allow_with_notice(format!(
                    "{} query limit reached; using overage allowance ({remaining} extra queries left).",
                    capitalize(breach.window.label())
                )));
            }
            GraceOutcome::Exhausted(breach) => breach,
        };

        self.usage
            .record_violation(
                ViolationType::from(breach.window),
                tier,
                breach.limit,
                breach.current,
                ViolationAction::Blocked,
                false,
            )
            .await?;
        info!(%tier, window = breach.window.label(), limit = breach.limit, "query blocked");
        Ok(QuotaDecision::deny(breach.denial_reason()))
    }

    pub async fn record_query(&self) -> TierguardResult<()> {
        let tier = self.current_tier().await?;
        self.usage.record_query(tier).await?;
        Ok(())
    }

    /// Count an uploaded document. `name` keys it in the upload history (and in
    /// [`Self::record_document_deletion`]); the format is the lowercased file
    /// extension.
    pub async fn record_document_upload(&self, name: &str, size_mb: f64) -> TierguardResult<()> {
        let tier = self.current_tier().await?;
        let format = document_format(name);
        self.usage
            .record_document_upload(name, size_mb, tier, &format)
            .await?;
        debug!(name, size_mb, %format, "document upload recorded");
        Ok(())
    }

    /// Mark the upload recorded under `name` as deleted.
    pub async fn record_document_deletion(&self, name: &str) -> TierguardResult<bool> {
        Ok(self.usage.record_document_deletion(name).await?)
    }

    pub async fn record_feature_usage(&self, flag: FeatureFlag) -> TierguardResult<()> {
        self.usage.record_feature_usage(flag).await?;
        Ok(())
    }
}

fn document_format(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "unknown".to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
