//! Quota decisions and derived usage figures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of every quota check. A denial is an expected result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl QuotaDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// Allowed, with an informational note (e.g. grace allowance consumed).
    pub fn allow_with_notice(notice: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: Some(notice.into()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaWindow {
    Monthly,
    Daily,
}

impl QuotaWindow {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Daily => "daily",
        }
    }
}

/// The window that caused a query denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBreach {
    pub window: QuotaWindow,
    pub limit: i64,
    /// Count before the rejected query.
    pub current: i64,
    pub resets_at: DateTime<Utc>,
}

impl LimitBreach {
    /// Human-readable denial for a query blocked by this window.
    pub fn denial_reason(&self) -> String {
        format!(
            "{} query limit reached ({}/{}); resets {}",
            self.window.label(),
            self.current,
            self.limit,
            self.resets_at.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

/// Result of checking the query counters against a tier's limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLimitCheck {
    pub decision: QuotaDecision,
    pub breach: Option<LimitBreach>,
}

/// What happened when a query over its limit asked for the overage allowance.
/// The breach is re-evaluated under the store lock, so a window that reset in
/// the meantime spends nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraceOutcome {
    /// No window is at its limit any more. Nothing was spent or recorded.
    WithinLimits,
    /// One unit was spent on `breach` and a `grace_allowed` violation recorded.
    Consumed { breach: LimitBreach, remaining: u32 },
    /// The allowance is empty. Nothing was written.
    Exhausted(LimitBreach),
}

/// Remaining query allowance. `-1` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingQuota {
    pub monthly_remaining: i64,
    pub daily_remaining: i64,
    pub monthly_used: i64,
    pub daily_used: i64,
    pub monthly_reset_date: DateTime<Utc>,
    pub daily_reset_date: DateTime<Utc>,
}

/// Signals derived from historical usage, persisted under `analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSignals {
    pub limit_hits_last_30_days: usize,
    pub avg_queries_per_day: f64,
    pub trending_up: bool,
    pub calculated_at: DateTime<Utc>,
}
