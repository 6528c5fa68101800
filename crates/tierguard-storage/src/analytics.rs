//! Upgrade signals derived from the usage history.

use chrono::{DateTime, Duration, Utc};
use tierguard_core::constants::SIGNAL_LOOKBACK_DAYS;
use tierguard_core::models::{UpgradeSignals, ViolationAction};

use crate::document::UsageDocument;

/// Compute signals from a post-reset document.
///
/// - `limit_hits_last_30_days`: blocked violations in the lookback
/// - `avg_queries_per_day`: monthly-history entries in the lookback / lookback days
/// - `trending_up`: last 7 days busier than the 7 days before
pub fn upgrade_signals(document: &UsageDocument, now: DateTime<Utc>) -> UpgradeSignals {
    let lookback_start = now - Duration::days(SIGNAL_LOOKBACK_DAYS);
    let limit_hits = document
        .usage
        .enforcement
        .count_since(lookback_start, Some(ViolationAction::Blocked));

    let history = &document.usage.queries.monthly.history;
    let in_lookback = history
        .iter()
        .filter(|h| h.timestamp >= lookback_start)
        .count();
    let avg_queries_per_day = in_lookback as f64 / SIGNAL_LOOKBACK_DAYS as f64;

    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    let last_week = history.iter().filter(|h| h.timestamp > week_ago).count();
    let week_before = history
        .iter()
        .filter(|h| h.timestamp > two_weeks_ago && h.timestamp <= week_ago)
        .count();

    UpgradeSignals {
        limit_hits_last_30_days: limit_hits,
        avg_queries_per_day,
        trending_up: last_week > week_before,
        calculated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use tierguard_core::models::Tier;

    use super::*;

    #[test]
    fn empty_history_has_no_signals() {
        let now = Utc::now();
        let signals = upgrade_signals(&UsageDocument::new(now, 5), now);
        assert_eq!(signals.limit_hits_last_30_days, 0);
        assert_eq!(signals.avg_queries_per_day, 0.0);
        assert!(!signals.trending_up);
    }

    #[test]
    fn recent_week_busier_is_trending() {
        let now = Utc::now();
        let mut doc = UsageDocument::new(now - Duration::days(20), 5);
        let monthly = &mut doc.usage.queries.monthly;
        monthly.record(now - Duration::days(10), Tier::Free);
        for h in 0..3 {
            monthly.record(now - Duration::hours(h + 1), Tier::Free);
        }
        let signals = upgrade_signals(&doc, now);
        assert!(signals.trending_up);
        assert!((signals.avg_queries_per_day - 4.0 / 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_weeks_are_not_trending() {
        let now = Utc::now();
        let mut doc = UsageDocument::new(now - Duration::days(20), 5);
        let monthly = &mut doc.usage.queries.monthly;
        monthly.record(now - Duration::days(10), Tier::Free);
        monthly.record(now - Duration::days(2), Tier::Free);
        assert!(!upgrade_signals(&doc, now).trending_up);
    }
}
