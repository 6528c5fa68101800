//! Shared harness: temp data dir, manual clock, recording collaborators.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tierguard_core::config::{LicenseEnvironment, TierguardConfig};
use tierguard_core::errors::{NotificationError, RegistryError};
use tierguard_core::{Clock, LicenseIssuer, ManualClock, Tier};
use tierguard_subscription::{
    DocumentEntry, DocumentRegistry, Notification, NotificationKind, NotificationSink,
    SubscriptionManager,
};

pub const DEV_SECRET: &str = "subscription-test-secret";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().map(|n| n.kind).collect()
    }
}

impl NotificationSink for RecordingSink {
    async fn create(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Every delivery fails.
#[derive(Debug, Clone, Default)]
pub struct FailingSink;

impl NotificationSink for FailingSink {
    async fn create(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Delivery("sink offline".to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    pub documents: Arc<Mutex<Vec<DocumentEntry>>>,
    pub fail_delete: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryRegistry {
    pub fn add(&self, id: &str, created_at: DateTime<Utc>) {
        self.add_named(id, id, created_at);
    }

    pub fn add_named(&self, id: &str, name: &str, created_at: DateTime<Utc>) {
        self.documents.lock().unwrap().push(DocumentEntry {
            id: id.to_string(),
            name: name.to_string(),
            created_at,
        });
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn fail_on(&self, id: &str) {
        self.fail_delete.lock().unwrap().insert(id.to_string());
    }
}

impl DocumentRegistry for InMemoryRegistry {
    async fn list(&self) -> Result<Vec<DocumentEntry>, RegistryError> {
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        if self.fail_delete.lock().unwrap().contains(id) {
            return Err(RegistryError::Unavailable(format!("cannot delete {id}")));
        }
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|d| d.id != id);
        if documents.len() == before {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

pub fn config(dir: &tempfile::TempDir) -> TierguardConfig {
    let mut config = TierguardConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();
    config.license.environment = LicenseEnvironment::Development;
    config.license.hmac_secret = Some(DEV_SECRET.to_string());
    config
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub clock: ManualClock,
    pub sink: RecordingSink,
    pub registry: InMemoryRegistry,
    pub manager: SubscriptionManager<RecordingSink, InMemoryRegistry>,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(start());
        let sink = RecordingSink::default();
        let registry = InMemoryRegistry::default();
        let manager = SubscriptionManager::open_with_clock(
            &config(&dir),
            Arc::new(clock.clone()),
            sink.clone(),
            registry.clone(),
        )
        .await
        .unwrap();
        Self {
            dir,
            clock,
            sink,
            registry,
            manager,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// A dev token for `tier`, valid for `days` from now.
    pub fn token(&self, tier: Tier, days: i64) -> String {
        LicenseIssuer::hs256(DEV_SECRET.as_bytes())
            .issue_license(tier, "lic-test", self.now(), self.now() + Duration::days(days))
            .unwrap()
    }

    /// Activate a paid license, then drop to paid_limited via a payment failure.
    pub async fn into_paid_limited(&self) {
        self.manager.activate_license(&self.token(Tier::Paid, 365)).await.unwrap();
        assert!(self.manager.handle_payment_failed().await.unwrap());
    }

    /// Upload `n` documents, one minute apart, into both the registry and the counters.
    pub async fn upload_documents(&self, n: usize) {
        for i in 0..n {
            let id = format!("doc-{i:02}.pdf");
            self.registry.add(&id, self.now());
            self.manager.record_document_upload(&id, 1.0).await.unwrap();
            self.advance(Duration::minutes(1));
        }
    }
}
