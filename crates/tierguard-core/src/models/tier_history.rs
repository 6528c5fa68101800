use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tier;

/// One tier tenure. `end_date == None` marks the current entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierHistoryEntry {
    pub tier: Tier,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

impl TierHistoryEntry {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}
