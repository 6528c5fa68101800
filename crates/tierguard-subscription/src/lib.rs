//! # tierguard-subscription
//!
//! The [`SubscriptionManager`] is the single entry point callers use before a
//! resource-consuming action: it resolves the current tier, checks quotas,
//! records usage, drives tier transitions and activates licenses.
//!
//! - `manager`: construction and subscription reads
//! - `lifecycle`: expiry checks, transitions, payment signals, license activation
//! - `quota`: upload/size/query checks and usage recording
//! - `insights`: usage stats, tier status, upgrade recommendations
//! - `blocking`: synchronous client running the manager on a worker thread
//!
//! Nothing here spawns background work; callers own any periodic
//! `check_tier_expiry` timer.

pub mod blocking;
pub mod insights;
pub mod lifecycle;
pub mod manager;
pub mod notify;
pub mod quota;
pub mod registry;

pub use blocking::BlockingSubscriptionClient;
pub use insights::{
    RecommendationKind, RecommendationPriority, TierStatus, UpgradeRecommendation, UsageCounter,
    UsagePercentage, UsageStats,
};
pub use lifecycle::CleanupReport;
pub use manager::SubscriptionManager;
pub use notify::{Notification, NotificationKind, NotificationSink, TracingNotificationSink};
pub use registry::{DocumentEntry, DocumentRegistry};
