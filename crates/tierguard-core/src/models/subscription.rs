//! The persisted subscription state owned by the subscription manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tier;

/// Current tier plus the time windows attached to it.
///
/// Trial fields are populated while the tier is trial (after first touch);
/// grace fields are populated only while the tier is paid_limited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub tier: Tier,
    #[serde(default)]
    pub trial_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trial_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grace_period_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grace_period_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_tier_change: Option<DateTime<Utc>>,
    /// Last activated license token, kept opaque.
    #[serde(default)]
    pub license_token: Option<String>,
}

impl Subscription {
    /// A never-touched subscription: trial with no window yet.
    pub fn new_trial() -> Self {
        Self {
            tier: Tier::Trial,
            trial_started_at: None,
            trial_expires_at: None,
            grace_period_started_at: None,
            grace_period_expires_at: None,
            last_tier_change: None,
            license_token: None,
        }
    }

    pub fn clear_grace_window(&mut self) {
        self.grace_period_started_at = None;
        self.grace_period_expires_at = None;
    }

    pub fn trial_expired(&self, now: DateTime<Utc>) -> bool {
        self.tier == Tier::Trial && self.trial_expires_at.is_some_and(|exp| now >= exp)
    }

    pub fn grace_expired(&self, now: DateTime<Utc>) -> bool {
        self.tier == Tier::PaidLimited && self.grace_period_expires_at.is_some_and(|exp| now >= exp)
    }

    /// Whole days left in whichever window the current tier carries.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let expires = match self.tier {
            Tier::Trial => self.trial_expires_at,
            Tier::PaidLimited => self.grace_period_expires_at,
            Tier::Free | Tier::Paid => None,
        }?;
        Some((expires - now).num_days().max(0))
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new_trial()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn unset_trial_window_never_expires() {
        let sub = Subscription::new_trial();
        assert!(!sub.trial_expired(Utc::now()));
        assert_eq!(sub.days_remaining(Utc::now()), None);
    }

    #[test]
    fn trial_expiry_is_inclusive() {
        let now = Utc::now();
        let mut sub = Subscription::new_trial();
        sub.trial_expires_at = Some(now);
        assert!(sub.trial_expired(now));
        assert!(!sub.trial_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn grace_only_counts_for_paid_limited() {
        let now = Utc::now();
        let mut sub = Subscription::new_trial();
        sub.tier = Tier::Paid;
        sub.grace_period_expires_at = Some(now - Duration::days(1));
        assert!(!sub.grace_expired(now));
        sub.tier = Tier::PaidLimited;
        assert!(sub.grace_expired(now));
    }
}
