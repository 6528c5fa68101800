//! SubscriptionManager: construction and subscription reads.
//!
//! One explicit handle per process, built at startup and passed to callers
//! directly, behind an `Arc`, or through [`crate::BlockingSubscriptionClient`].

use std::sync::Arc;

use tierguard_core::clock::{Clock, SystemClock};
use tierguard_core::config::{LifecycleConfig, TierguardConfig};
use tierguard_core::licensing::LicenseValidator;
use tierguard_core::models::{ApiKeyMode, Subscription, Tier};
use tierguard_core::TierguardResult;
use tierguard_storage::{SubscriptionStore, UsageStore, UsageStoreOptions};
use tracing::{info, warn};

use crate::notify::{Notification, NotificationSink};
use crate::registry::DocumentRegistry;

pub struct SubscriptionManager<N, D> {
    pub(crate) usage: UsageStore,
    pub(crate) subscriptions: SubscriptionStore,
    pub(crate) validator: LicenseValidator,
    pub(crate) lifecycle: LifecycleConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) sink: N,
    pub(crate) registry: D,
}

impl<N: NotificationSink, D: DocumentRegistry> SubscriptionManager<N, D> {
    /// Open both stores under `config.storage.data_dir` using the system clock.
    pub async fn open(config: &TierguardConfig, sink: N, registry: D) -> TierguardResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock), sink, registry).await
    }

    pub async fn open_with_clock(
        config: &TierguardConfig,
        clock: Arc<dyn Clock>,
        sink: N,
        registry: D,
    ) -> TierguardResult<Self> {
        let validator = LicenseValidator::from_config(&config.license, Arc::clone(&clock))?;
        let usage = UsageStore::open(
            config.storage.usage_path(),
            Arc::clone(&clock),
            UsageStoreOptions::from(&config.lifecycle),
        )
        .await?;
        let subscriptions = SubscriptionStore::open(config.storage.subscription_path()).await?;

        info!(
            data_dir = %config.storage.data_dir.display(),
            environment = ?config.license.environment,
            "subscription manager ready"
        );
        Ok(Self {
            usage,
            subscriptions,
            validator,
            lifecycle: config.lifecycle.clone(),
            clock,
            sink,
            registry,
        })
    }

    pub async fn get_current_subscription(&self) -> TierguardResult<Subscription> {
        Ok(self.subscriptions.load().await?.subscription)
    }

    /// Whether bundled API keys may be used under the current tier.
    pub async fn api_key_mode(&self) -> TierguardResult<ApiKeyMode> {
        Ok(self.subscriptions.load().await?.settings.api_key_mode)
    }

    /// Direct access to the usage counters.
    pub fn usage_store(&self) -> &UsageStore {
        &self.usage
    }

    pub(crate) async fn current_tier(&self) -> TierguardResult<Tier> {
        Ok(self.subscriptions.load().await?.subscription.tier)
    }

    /// Deliver a notification. Failures are logged and dropped.
    pub(crate) async fn notify(&self, notification: Notification) {
        let kind = notification.kind;
        if let Err(e) = self.sink.create(notification).await {
            warn!(?kind, error = %e, "notification delivery failed");
        }
    }
}
