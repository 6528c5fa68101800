//! Subscription tiers and the API-key mode a tier implies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// A named subscription level controlling feature limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Trial,
    Free,
    Paid,
    PaidLimited,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Self::Trial, Self::Free, Self::Paid, Self::PaidLimited];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Free => "free",
            Self::Paid => "paid",
            Self::PaidLimited => "paid_limited",
        }
    }

    /// Parse a tier name. Only the canonical snake_case names are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(Self::Trial),
            "free" => Some(Self::Free),
            "paid" => Some(Self::Paid),
            "paid_limited" => Some(Self::PaidLimited),
            _ => None,
        }
    }

    /// Tiers that are shown upgrade prompts.
    pub fn is_unpaid(&self) -> bool {
        matches!(self, Self::Trial | Self::Free)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConfigError::UnknownTier {
            name: s.to_string(),
        })
    }
}

/// Which API keys the client may use for third-party services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyMode {
    /// Bundled keys are available.
    #[default]
    Default,
    /// The client must supply its own keys.
    CustomOnly,
}

impl ApiKeyMode {
    /// Mode implied by entering a tier.
    pub fn for_default_keys(use_default_keys: bool) -> Self {
        if use_default_keys {
            Self::Default
        } else {
            Self::CustomOnly
        }
    }
}
