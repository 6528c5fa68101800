//! User-facing notifications emitted on tier changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tierguard_core::constants::NOTIFICATION_SOURCE;
use tierguard_core::errors::NotificationError;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TrialStarted,
    TrialEnded,
    Downgraded,
    PaymentIssue,
    PaymentRestored,
    WelcomePaid,
    TierChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub source: String,
    pub title: String,
    pub summary: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            kind,
            source: NOTIFICATION_SOURCE.to_string(),
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// Receiver for notifications. Delivery is fire-and-forget: the manager logs
/// and drops any error.
#[allow(async_fn_in_trait)]
pub trait NotificationSink: Send + Sync {
    async fn create(&self, notification: Notification) -> Result<(), NotificationError>;
}

impl<T: NotificationSink> NotificationSink for Arc<T> {
    async fn create(&self, notification: Notification) -> Result<(), NotificationError> {
        (**self).create(notification).await
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    async fn create(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            kind = ?notification.kind,
            source = %notification.source,
            title = %notification.title,
            summary = %notification.summary,
            "notification"
        );
        Ok(())
    }
}
