//! UsageStore behaviour: counters, lazy resets, documents, grace allowance,
//! tier history, analytics and durability.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tierguard_core::models::{FeatureFlag, GraceOutcome, QuotaWindow, Tier, ViolationAction, ViolationType};
use tierguard_core::{ManualClock, TierCatalog, TierguardErrorCode};
use tierguard_storage::{UsageStore, UsageStoreOptions};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
}

async fn setup() -> (tempfile::TempDir, ManualClock, UsageStore) {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(start());
    let store = UsageStore::open(
        dir.path().join("usage.json"),
        Arc::new(clock.clone()),
        UsageStoreOptions::default(),
    )
    .await
    .unwrap();
    (dir, clock, store)
}

fn raw(store: &UsageStore) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap()
}

// ============================================================
// Queries
// ============================================================

#[tokio::test]
async fn fresh_store_writes_nothing_until_first_mutation() {
    let (_dir, _clock, store) = setup().await;
    assert_eq!(store.get_document_count().await.unwrap(), 0);
    assert!(!store.path().exists());

    store.record_query(Tier::Trial).await.unwrap();
    assert!(store.path().exists());
    assert_eq!(raw(&store)["schema_version"], 3);
}

#[tokio::test]
async fn record_query_counts_both_windows() {
    let (_dir, _clock, store) = setup().await;
    for _ in 0..3 {
        store.record_query(Tier::Free).await.unwrap();
    }
    let doc = store.snapshot().await.unwrap();
    assert_eq!(doc.usage.queries.monthly.count, 3);
    assert_eq!(doc.usage.queries.daily.count, 3);
    assert_eq!(doc.usage.queries.monthly.history.len(), 3);
    assert!(doc.usage.queries.daily.history.iter().all(|h| h.tier == Tier::Free));
}

#[tokio::test]
async fn daily_window_resets_and_monthly_keeps_counting() {
    let (_dir, clock, store) = setup().await;
    store.record_query(Tier::Free).await.unwrap();
    store.record_query(Tier::Free).await.unwrap();

    clock.advance(Duration::days(1));
    store.record_query(Tier::Free).await.unwrap();

    let doc = store.snapshot().await.unwrap();
    assert_eq!(doc.usage.queries.daily.count, 1);
    assert_eq!(doc.usage.queries.monthly.count, 3);
    assert_eq!(doc.usage.queries.daily.reset_date, start() + Duration::days(2));
}

#[tokio::test]
async fn expired_monthly_window_resets_from_now() {
    let (_dir, clock, store) = setup().await;
    store.record_query(Tier::Free).await.unwrap();

    clock.advance(Duration::days(75));
    store.record_query(Tier::Free).await.unwrap();

    let doc = store.snapshot().await.unwrap();
    assert_eq!(doc.usage.queries.monthly.count, 1);
    assert_eq!(
        doc.usage.queries.monthly.reset_date,
        start() + Duration::days(75) + Duration::days(30)
    );
}

#[tokio::test]
async fn reads_reset_their_snapshot_without_persisting() {
    let (_dir, clock, store) = setup().await;
    store.record_query(Tier::Free).await.unwrap();
    clock.advance(Duration::days(31));

    let remaining = store
        .get_remaining(&TierCatalog::features(Tier::Free))
        .await
        .unwrap();
    assert_eq!(remaining.monthly_used, 0);
    assert_eq!(raw(&store)["usage"]["queries"]["monthly"]["count"], 1);
}

#[tokio::test]
async fn same_instant_does_not_double_reset() {
    let (_dir, clock, store) = setup().await;
    store.record_query(Tier::Free).await.unwrap();
    clock.advance(Duration::days(30));

    store.record_query(Tier::Free).await.unwrap();
    store.record_query(Tier::Free).await.unwrap();
    let doc = store.snapshot().await.unwrap();
    assert_eq!(doc.usage.queries.monthly.count, 2);
    assert_eq!(doc.usage.queries.monthly.reset_date, clock_now(&clock) + Duration::days(30));
}

fn clock_now(clock: &ManualClock) -> DateTime<Utc> {
    tierguard_core::Clock::now(clock)
}

#[tokio::test]
async fn monthly_limit_is_checked_before_daily() {
    let (_dir, _clock, store) = setup().await;
    let mut limits = TierCatalog::features(Tier::Free);
    limits.max_queries_monthly = 2;
    limits.max_queries_daily = 2;
    store.record_query(Tier::Free).await.unwrap();
    assert!(store.check_query_limit(&limits).await.unwrap().decision.allowed);

    store.record_query(Tier::Free).await.unwrap();
    let check = store.check_query_limit(&limits).await.unwrap();
    assert!(!check.decision.allowed);
    assert!(check.decision.reason.unwrap().contains("monthly"));
    let breach = check.breach.unwrap();
    assert_eq!(breach.limit, 2);
    assert_eq!(breach.current, 2);
}

#[tokio::test]
async fn daily_breach_is_reported_when_monthly_has_room() {
    let (_dir, _clock, store) = setup().await;
    let limits = TierCatalog::features(Tier::Free);
    for _ in 0..limits.max_queries_daily {
        store.record_query(Tier::Free).await.unwrap();
    }
    let check = store.check_query_limit(&limits).await.unwrap();
    assert!(!check.decision.allowed);
    assert_eq!(
        check.breach.unwrap().window,
        tierguard_core::models::QuotaWindow::Daily
    );
}

#[tokio::test]
async fn unlimited_tier_always_passes() {
    let (_dir, _clock, store) = setup().await;
    for _ in 0..60 {
        store.record_query(Tier::Paid).await.unwrap();
    }
    let paid = TierCatalog::features(Tier::Paid);
    assert!(store.check_query_limit(&paid).await.unwrap().decision.allowed);

    let remaining = store.get_remaining(&paid).await.unwrap();
    assert_eq!(remaining.monthly_remaining, -1);
    assert_eq!(remaining.daily_remaining, -1);
    assert_eq!(remaining.monthly_used, 60);
}

#[tokio::test]
async fn remaining_never_goes_negative() {
    let (_dir, _clock, store) = setup().await;
    for _ in 0..12 {
        store.record_query(Tier::Free).await.unwrap();
    }
    let remaining = store
        .get_remaining(&TierCatalog::features(Tier::Free))
        .await
        .unwrap();
    assert_eq!(remaining.daily_remaining, 0);
    assert_eq!(remaining.monthly_remaining, 38);
}

// ============================================================
// Documents
// ============================================================

#[tokio::test]
async fn uploads_and_deletions_track_visible_count() {
    let (_dir, _clock, store) = setup().await;
    store.record_document_upload("a", 4.0, Tier::Trial, "pdf").await.unwrap();
    store.record_document_upload("b", 6.5, Tier::Trial, "docx").await.unwrap();
    assert_eq!(store.get_document_count().await.unwrap(), 2);
    assert_eq!(store.get_storage_used_mb().await.unwrap(), 10.5);

    assert!(store.record_document_deletion("a").await.unwrap());
    assert!(!store.record_document_deletion("a").await.unwrap());
    assert_eq!(store.get_document_count().await.unwrap(), 1);
    assert_eq!(store.get_storage_used_mb().await.unwrap(), 6.5);

    let doc = store.snapshot().await.unwrap();
    assert_eq!(doc.usage.documents.total_count, 2);
    let a = doc
        .usage
        .documents
        .upload_history
        .iter()
        .find(|u| u.document_id == "a")
        .unwrap();
    assert!(a.deleted_at.is_some());
}

#[tokio::test]
async fn visible_count_never_goes_below_zero() {
    let (_dir, _clock, store) = setup().await;
    assert!(!store.record_document_deletion("ghost").await.unwrap());
    assert_eq!(store.get_document_count().await.unwrap(), 0);
}

// ============================================================
// Grace allowance & violations
// ============================================================

fn free_limits() -> tierguard_core::TierDefinition {
    TierCatalog::features(Tier::Free)
}

async fn record_queries(store: &UsageStore, n: usize) {
    for _ in 0..n {
        store.record_query(Tier::Free).await.unwrap();
    }
}

#[tokio::test]
async fn consuming_grace_decrements_and_records() {
    let (_dir, clock, store) = setup().await;
    store.update_grace_periods(3, clock_now(&clock)).await.unwrap();
    record_queries(&store, 10).await;

    let outcome = store.try_consume_grace(Tier::Free, &free_limits()).await.unwrap();
    let GraceOutcome::Consumed { breach, remaining } = outcome else {
        panic!("expected grace to be spent, got {outcome:?}");
    };
    assert_eq!(remaining, 2);
    assert_eq!(breach.window, QuotaWindow::Daily);
    assert_eq!(store.grace_remaining().await.unwrap(), 2);

    let doc = store.snapshot().await.unwrap();
    let violations = &doc.usage.enforcement.violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation_type, ViolationType::DailyQueryLimit);
    assert_eq!(violations[0].action_taken, ViolationAction::GraceAllowed);
    assert!(violations[0].grace_used);
    assert_eq!(violations[0].attempted, 10);
    assert_eq!(violations[0].limit, 10);
}

#[tokio::test]
async fn exhausted_grace_changes_nothing() {
    let (_dir, clock, store) = setup().await;
    store.update_grace_periods(0, clock_now(&clock)).await.unwrap();
    record_queries(&store, 10).await;

    let outcome = store.try_consume_grace(Tier::Free, &free_limits()).await.unwrap();
    assert!(matches!(outcome, GraceOutcome::Exhausted(b) if b.current == 10));
    assert_eq!(store.grace_remaining().await.unwrap(), 0);
    assert!(store.snapshot().await.unwrap().usage.enforcement.violations.is_empty());
}

#[tokio::test]
async fn grace_is_not_spent_once_the_window_has_reset() {
    let (_dir, clock, store) = setup().await;
    record_queries(&store, 10).await;
    assert!(store.check_query_limit(&free_limits()).await.unwrap().breach.is_some());

    // the daily window rolls over between the check and the spend
    clock.advance(Duration::days(1));
    let outcome = store.try_consume_grace(Tier::Free, &free_limits()).await.unwrap();
    assert_eq!(outcome, GraceOutcome::WithinLimits);
    assert_eq!(store.grace_remaining().await.unwrap(), 5);
    assert!(store.snapshot().await.unwrap().usage.enforcement.violations.is_empty());
}

#[tokio::test]
async fn unlimited_tier_never_spends_grace() {
    let (_dir, _clock, store) = setup().await;
    for _ in 0..60 {
        store.record_query(Tier::Paid).await.unwrap();
    }
    let paid = TierCatalog::features(Tier::Paid);
    assert_eq!(
        store.try_consume_grace(Tier::Paid, &paid).await.unwrap(),
        GraceOutcome::WithinLimits
    );
}

#[tokio::test]
async fn grace_replenishes_after_thirty_days() {
    let (_dir, clock, store) = setup().await;
    store.update_grace_periods(0, clock_now(&clock)).await.unwrap();

    clock.advance(Duration::days(29));
    assert_eq!(store.grace_remaining().await.unwrap(), 0);
    clock.advance(Duration::days(1));
    assert_eq!(store.grace_remaining().await.unwrap(), 5);
}

#[tokio::test]
async fn violation_counts_respect_window_and_action() {
    let (_dir, clock, store) = setup().await;
    store
        .record_violation(ViolationType::DocumentLimit, Tier::Free, 3, 3, ViolationAction::Blocked, false)
        .await
        .unwrap();
    clock.advance(Duration::days(31));
    store
        .record_violation(ViolationType::DailyQueryLimit, Tier::Free, 10, 10, ViolationAction::Blocked, false)
        .await
        .unwrap();
    store
        .record_violation(
            ViolationType::DailyQueryLimit,
            Tier::Free,
            10,
            10,
            ViolationAction::GraceAllowed,
            true,
        )
        .await
        .unwrap();

    assert_eq!(store.count_violations_since(30, None).await.unwrap(), 2);
    assert_eq!(
        store
            .count_violations_since(30, Some(ViolationAction::Blocked))
            .await
            .unwrap(),
        1
    );
    assert_eq!(store.count_violations_since(60, None).await.unwrap(), 3);
}

// ============================================================
// License & analytics
// ============================================================

#[tokio::test]
async fn tier_change_closes_previous_entry() {
    let (_dir, clock, store) = setup().await;
    clock.advance(Duration::days(7));
    store
        .record_tier_change(Tier::Trial, Tier::Free, "trial expired", None, None)
        .await
        .unwrap();

    let history = store.tier_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].tier, Tier::Trial);
    assert_eq!(history[0].end_date, Some(start() + Duration::days(7)));
    assert_eq!(history[1].tier, Tier::Free);
    assert!(history[1].is_open());
    assert_eq!(history.iter().filter(|e| e.is_open()).count(), 1);
    assert_eq!(store.snapshot().await.unwrap().license.current_tier, Tier::Free);
}

#[tokio::test]
async fn license_validation_is_stamped() {
    let (_dir, _clock, store) = setup().await;
    store
        .record_license_validation("lic-9", Tier::Paid, "RS256")
        .await
        .unwrap();
    let validation = store.snapshot().await.unwrap().license.validation.unwrap();
    assert_eq!(validation.license_id, "lic-9");
    assert_eq!(validation.algorithm, "RS256");
    assert_eq!(validation.last_validated_at, start());
}

#[tokio::test]
async fn feature_flags_stick() {
    let (_dir, _clock, store) = setup().await;
    store.record_feature_usage(FeatureFlag::BulkUpload).await.unwrap();
    store.record_feature_usage(FeatureFlag::BulkUpload).await.unwrap();
    let flags = store.feature_flags().await.unwrap();
    assert!(flags.bulk_upload);
    assert!(!flags.export);
    assert!(flags.any_premium());
}

#[tokio::test]
async fn upgrade_signals_are_persisted() {
    let (_dir, clock, store) = setup().await;
    for _ in 0..6 {
        store.record_query(Tier::Free).await.unwrap();
    }
    store
        .record_violation(ViolationType::MonthlyQueryLimit, Tier::Free, 50, 50, ViolationAction::Blocked, false)
        .await
        .unwrap();

    let signals = store.calculate_upgrade_signals().await.unwrap();
    assert_eq!(signals.limit_hits_last_30_days, 1);
    assert!((signals.avg_queries_per_day - 0.2).abs() < 1e-9);
    assert!(signals.trending_up);
    assert_eq!(signals.calculated_at, clock_now(&clock));

    let persisted = store.snapshot().await.unwrap().analytics.tier_upgrade_signals;
    assert_eq!(persisted, Some(signals));
}

// ============================================================
// Durability
// ============================================================

#[tokio::test]
async fn counters_survive_reopen() {
    let (dir, clock, store) = setup().await;
    store.record_query(Tier::Trial).await.unwrap();
    store.record_document_upload("x", 1.0, Tier::Trial, "txt").await.unwrap();
    drop(store);

    let reopened = UsageStore::open(
        dir.path().join("usage.json"),
        Arc::new(clock.clone()),
        UsageStoreOptions::default(),
    )
    .await
    .unwrap();
    let doc = reopened.snapshot().await.unwrap();
    assert_eq!(doc.usage.queries.monthly.count, 1);
    assert_eq!(doc.usage.documents.current_visible, 1);
}

#[tokio::test]
async fn corrupt_store_is_an_error_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.json");
    std::fs::write(&path, b"{\"schema_version\": 3, \"usage\": ").unwrap();

    let err = UsageStore::open(&path, Arc::new(ManualClock::new(start())), UsageStoreOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_CORRUPT");
    assert_eq!(std::fs::read(&path).unwrap(), b"{\"schema_version\": 3, \"usage\": ");
}

#[tokio::test]
async fn concurrent_writers_do_not_lose_updates() {
    let (_dir, _clock, store) = setup().await;
    let store = Arc::new(store);
    let mut tasks = Vec::new();
    for _ in 0..25 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move { store.record_query(Tier::Trial).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(store.snapshot().await.unwrap().usage.queries.monthly.count, 25);
}
