//! Property tests for the query counters.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tierguard_core::models::Tier;
use tierguard_core::{Clock, ManualClock};
use tierguard_storage::{UsageStore, UsageStoreOptions};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Within a window, each recorded query raises the count by exactly one.
    #[test]
    fn record_query_never_decreases(steps in prop::collection::vec(0i64..120, 1..20)) {
        let rt = runtime();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
            let clock = ManualClock::new(start);
            let store = UsageStore::open(
                dir.path().join("usage.json"),
                Arc::new(clock.clone()),
                UsageStoreOptions::default(),
            )
            .await
            .unwrap();

            let mut previous = 0;
            for minutes in steps {
                clock.advance(Duration::minutes(minutes));
                let before = store.snapshot().await.unwrap();
                store.record_query(Tier::Free).await.unwrap();
                let after = store.snapshot().await.unwrap();

                // Only a window rollover may lower the count.
                if before.usage.queries.daily.reset_date > clock.now() {
                    prop_assert_eq!(after.usage.queries.daily.count, before.usage.queries.daily.count + 1);
                }
                prop_assert!(after.usage.queries.monthly.count >= previous);
                previous = after.usage.queries.monthly.count;
            }
            Ok(())
        })?;
    }

    /// After any gap of at least one window, the next touch starts a fresh window at now.
    #[test]
    fn reset_anchors_at_touch_time(gap_days in 30i64..400) {
        let rt = runtime();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap());
            let store = UsageStore::open(
                dir.path().join("usage.json"),
                Arc::new(clock.clone()),
                UsageStoreOptions::default(),
            )
            .await
            .unwrap();
            store.record_query(Tier::Free).await.unwrap();

            clock.advance(Duration::days(gap_days));
            store.record_query(Tier::Free).await.unwrap();
            let doc = store.snapshot().await.unwrap();
            prop_assert_eq!(doc.usage.queries.monthly.count, 1);
            prop_assert_eq!(doc.usage.queries.monthly.reset_date, clock.now() + Duration::days(30));
            Ok(())
        })?;
    }
}
