//! Derived views over usage: stats, tier status and upgrade recommendations.

use serde::{Deserialize, Serialize};
use tierguard_core::catalog::{TierCatalog, TierDefinition};
use tierguard_core::constants::{
    HIGH_USAGE_QUERIES_PER_DAY, SIGNAL_LOOKBACK_DAYS, UPGRADE_PROMPT_PCT, USAGE_WARNING_PCT,
};
use tierguard_core::models::{ApiKeyMode, RemainingQuota, Tier, ViolationAction};
use tierguard_core::TierguardResult;
use tierguard_storage::FeatureFlags;

use crate::manager::SubscriptionManager;
use crate::notify::NotificationSink;
use crate::registry::DocumentRegistry;

/// Everything a usage dashboard needs in one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub tier: Tier,
    pub features: TierDefinition,
    pub queries: RemainingQuota,
    pub documents_visible: i64,
    pub documents_uploaded: i64,
    pub storage_used_mb: f64,
    pub grace_queries_remaining: u32,
    pub violations_last_30_days: usize,
    pub api_key_mode: ApiKeyMode,
    pub feature_flags: FeatureFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCounter {
    MonthlyQueries,
    DailyQueries,
    Documents,
}

impl UsageCounter {
    fn label(&self) -> &'static str {
        match self {
            Self::MonthlyQueries => "monthly queries",
            Self::DailyQueries => "daily queries",
            Self::Documents => "documents",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePercentage {
    pub counter: UsageCounter,
    pub used: i64,
    pub limit: i64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierStatus {
    pub tier: Tier,
    pub features: TierDefinition,
    /// One entry per limited counter; unlimited counters are skipped.
    pub usage: Vec<UsagePercentage>,
    pub warnings: Vec<String>,
    pub upgrade_prompt: Option<String>,
    /// Days left in the trial or grace window, if the tier has one.
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    LimitHits,
    HighUsage,
    TrendingUp,
    FeatureUsage,
}

/// Ordered most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRecommendation {
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub message: String,
}

impl<N: NotificationSink, D: DocumentRegistry> SubscriptionManager<N, D> {
    pub async fn get_usage_stats(&self) -> TierguardResult<UsageStats> {
        let record = self.subscriptions.load().await?;
        let tier = record.subscription.tier;
        let features = TierCatalog::features(tier);
        let document = self.usage.snapshot().await?;
        let queries = self.usage.get_remaining(&features).await?;
        let violations = self
            .usage
            .count_violations_since(SIGNAL_LOOKBACK_DAYS, None)
            .await?;

        Ok(UsageStats {
            tier,
            features,
            queries,
            documents_visible: document.usage.documents.current_visible,
            documents_uploaded: document.usage.documents.total_count,
            storage_used_mb: document.usage.documents.storage_used_mb(),
            grace_queries_remaining: document.usage.enforcement.grace_periods.query_overage_remaining,
            violations_last_30_days: violations,
            api_key_mode: record.settings.api_key_mode,
            feature_flags: document.usage.features,
        })
    }

    /// Percent used per limited counter, with warnings at 90% and an upgrade
    /// prompt for trial/free at 80%.
    pub async fn get_tier_status(&self) -> TierguardResult<TierStatus> {
        let subscription = self.get_current_subscription().await?;
        let tier = subscription.tier;
        let features = TierCatalog::features(tier);
        let remaining = self.usage.get_remaining(&features).await?;
        let documents = self.usage.get_document_count().await?;

        let usage: Vec<UsagePercentage> = [
            (UsageCounter::MonthlyQueries, remaining.monthly_used, features.max_queries_monthly),
            (UsageCounter::DailyQueries, remaining.daily_used, features.max_queries_daily),
            (UsageCounter::Documents, documents, features.max_documents),
        ]
        .into_iter()
        .filter(|(_, _, limit)| !TierDefinition::is_unlimited(*limit) && *limit > 0)
        .map(|(counter, used, limit)| UsagePercentage {
            counter,
            used,
            limit,
            pct: used as f64 / limit as f64 * 100.0,
        })
        .collect();

        let warnings = usage
            .iter()
            .filter(|u| u.pct >= USAGE_WARNING_PCT)
            .map(|u| {
                format!(
                    "You have used {:.0}% of your {} ({}/{}).",
                    u.pct,
                    u.counter.label(),
                    u.used,
                    u.limit
                )
            })
            .collect();

        let upgrade_prompt = if tier.is_unpaid() && usage.iter().any(|u| u.pct >= UPGRADE_PROMPT_PCT) {
            Some(format!(
                "You are close to the limits of the {tier} tier. Upgrade to paid for unlimited documents and queries."
            ))
        } else {
            None
        };

        Ok(TierStatus {
            tier,
            features,
            usage,
            warnings,
            upgrade_prompt,
            days_remaining: subscription.days_remaining(self.clock.now()),
        })
    }

    /// Recommendations ordered by priority. Empty on the paid tier.
    ///
    /// | kind          | priority | condition                              |
    /// |---------------|----------|----------------------------------------|
    /// | limit_hits    | high     | a blocked violation in the last 30 days |
    /// | high_usage    | medium   | more than 10 queries/day on average     |
    /// | trending_up   | medium   | last week busier than the week before  |
    /// | feature_usage | low      | any premium feature used               |
    pub async fn get_upgrade_recommendations(&self) -> TierguardResult<Vec<UpgradeRecommendation>> {
        if self.current_tier().await? == Tier::Paid {
            return Ok(Vec::new());
        }

        let signals = self.usage.calculate_upgrade_signals().await?;
        let blocked = self
            .usage
            .count_violations_since(SIGNAL_LOOKBACK_DAYS, Some(ViolationAction::Blocked))
            .await?;
        let flags = self.usage.feature_flags().await?;

        let mut recommendations = Vec::new();
        if blocked > 0 {
            recommendations.push(UpgradeRecommendation {
                kind: RecommendationKind::LimitHits,
                priority: RecommendationPriority::High,
                message: format!(
                    "You hit a usage limit {blocked} time(s) in the last {SIGNAL_LOOKBACK_DAYS} days. \
                     Upgrade to remove the limits."
                ),
            });
        }
        if signals.avg_queries_per_day > HIGH_USAGE_QUERIES_PER_DAY {
            recommendations.push(UpgradeRecommendation {
                kind: RecommendationKind::HighUsage,
                priority: RecommendationPriority::Medium,
                message: format!(
                    "You average {:.1} queries per day. Paid plans have no query limits.",
                    signals.avg_queries_per_day
                ),
            });
        }
        if signals.trending_up {
            recommendations.push(UpgradeRecommendation {
                kind: RecommendationKind::TrendingUp,
                priority: RecommendationPriority::Medium,
                message: "Your usage is growing week over week.".to_string(),
            });
        }
        if flags.any_premium() {
            recommendations.push(UpgradeRecommendation {
                kind: RecommendationKind::FeatureUsage,
                priority: RecommendationPriority::Low,
                message: "You are using premium features that paid plans fully support.".to_string(),
            });
        }
        recommendations.sort_by_key(|r| r.priority);
        Ok(recommendations)
    }
}
