//! # tierguard-storage
//!
//! Persistence for Tierguard. Two whole-document JSON files:
//! - `usage.json`: query/document counters, violations, grace allowance,
//!   tier history, feature flags, analytics. Versioned and migrated on load.
//! - `subscription.json`: the current [`Subscription`](tierguard_core::Subscription)
//!   plus the API-key setting.
//!
//! Each store serializes its mutations behind one async mutex. Reads take no
//! lock and see the last complete write.

pub mod analytics;
pub mod document;
mod json_file;
pub mod migrations;
pub mod subscription_store;
pub mod usage_store;

pub use document::{FeatureFlags, UploadEntry, UsageDocument};
pub use subscription_store::{SubscriptionRecord, SubscriptionSettings, SubscriptionStore};
pub use usage_store::{UsageStore, UsageStoreOptions};
