use std::fmt;

use serde::{Deserialize, Serialize};

/// Feature-usage flags tracked for upgrade signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    CustomApiKeys,
    BulkUpload,
    AdvancedSearch,
    Export,
}

impl FeatureFlag {
    pub const ALL: [FeatureFlag; 4] = [
        Self::CustomApiKeys,
        Self::BulkUpload,
        Self::AdvancedSearch,
        Self::Export,
    ];

    /// Premium flags feed the `feature_usage` upgrade recommendation.
    pub fn is_premium(&self) -> bool {
        !matches!(self, Self::CustomApiKeys)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomApiKeys => "custom_api_keys",
            Self::BulkUpload => "bulk_upload",
            Self::AdvancedSearch => "advanced_search",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
