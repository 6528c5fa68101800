//! The synchronous client, driven from plain threads.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{config, start, InMemoryRegistry, RecordingSink, DEV_SECRET};
use tierguard_core::{LicenseIssuer, ManualClock, Tier, TierguardErrorCode};
use tierguard_subscription::{BlockingSubscriptionClient, NotificationKind};

fn open(dir: &tempfile::TempDir, clock: &ManualClock, sink: &RecordingSink) -> BlockingSubscriptionClient {
    BlockingSubscriptionClient::open_with_clock(
        config(dir),
        Arc::new(clock.clone()),
        sink.clone(),
        InMemoryRegistry::default(),
    )
    .unwrap()
}

#[test]
fn trial_lifecycle_through_blocking_client() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(start());
    let sink = RecordingSink::default();
    let client = open(&dir, &clock, &sink);

    assert!(!client.check_tier_expiry().unwrap());
    assert_eq!(client.get_current_subscription().unwrap().tier, Tier::Trial);

    clock.advance(Duration::days(8));
    assert!(client.check_tier_expiry().unwrap());
    assert_eq!(client.get_current_subscription().unwrap().tier, Tier::Free);
    assert_eq!(
        sink.kinds(),
        vec![NotificationKind::TrialStarted, NotificationKind::TrialEnded]
    );
}

#[test]
fn quota_calls_match_the_async_manager() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(start());
    let sink = RecordingSink::default();
    let client = open(&dir, &clock, &sink);

    assert!(client.transition_tier(Tier::Free, "test setup").unwrap());
    for i in 0..3 {
        assert!(client.check_upload_allowed().unwrap().allowed);
        client.record_document_upload(&format!("notes-{i}.md"), 1.0).unwrap();
    }
    let denied = client.check_upload_allowed().unwrap();
    assert!(!denied.allowed);

    assert!(client.record_document_deletion("notes-0.md").unwrap());
    assert!(client.check_upload_allowed().unwrap().allowed);

    client.record_query().unwrap();
    let stats = client.get_usage_stats().unwrap();
    assert_eq!(stats.documents_visible, 2);
    assert_eq!(stats.queries.monthly_used, 1);
    assert_eq!(client.get_tier_status().unwrap().tier, Tier::Free);
}

#[test]
fn license_activation_over_the_channel() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(start());
    let sink = RecordingSink::default();
    let client = open(&dir, &clock, &sink);

    let token = LicenseIssuer::hs256(DEV_SECRET.as_bytes())
        .issue_license(Tier::Paid, "lic-blocking", start(), start() + Duration::days(30))
        .unwrap();
    let subscription = client.activate_license(&token).unwrap();
    assert_eq!(subscription.tier, Tier::Paid);
    assert!(client.get_upgrade_recommendations().unwrap().is_empty());

    let err = client.activate_license("not-a-token").unwrap_err();
    assert_eq!(err.error_code(), "LICENSE_MALFORMED");
}

#[test]
fn open_reports_corrupt_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("usage.json"), b"{ not json").unwrap();

    let result = BlockingSubscriptionClient::open_with_clock(
        config(&dir),
        Arc::new(ManualClock::new(start())),
        RecordingSink::default(),
        InMemoryRegistry::default(),
    );
    assert!(result.is_err());

    // the unreadable file is left alone
    let raw = std::fs::read(dir.path().join("usage.json")).unwrap();
    assert_eq!(raw, b"{ not json");
}

#[test]
fn state_survives_drop_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(start());
    let sink = RecordingSink::default();

    {
        let client = open(&dir, &clock, &sink);
        client.record_query().unwrap();
        client.record_query().unwrap();
    }

    let client = open(&dir, &clock, &sink);
    assert_eq!(client.get_usage_stats().unwrap().queries.monthly_used, 2);
}
