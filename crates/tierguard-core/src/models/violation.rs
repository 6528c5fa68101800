//! Quota violation records. Append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{QuotaWindow, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    DocumentLimit,
    MonthlyQueryLimit,
    DailyQueryLimit,
}

impl From<QuotaWindow> for ViolationType {
    fn from(window: QuotaWindow) -> Self {
        match window {
            QuotaWindow::Monthly => Self::MonthlyQueryLimit,
            QuotaWindow::Daily => Self::DailyQueryLimit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationAction {
    Blocked,
    GraceAllowed,
}

/// A quota check that failed, or passed only through the grace allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub timestamp: DateTime<Utc>,
    pub violation_type: ViolationType,
    pub tier: Tier,
    pub limit: i64,
    /// Count before the rejected action; a rejected action is never consumed.
    pub attempted: i64,
    pub action_taken: ViolationAction,
    pub grace_used: bool,
}
