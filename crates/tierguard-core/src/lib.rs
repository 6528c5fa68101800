//! # tierguard-core
//!
//! Foundation crate for Tierguard.
//! Defines the tier catalog, subscription and usage models, license token
//! validation, errors, config, the injectable clock and tracing setup.
//! Every other crate in the workspace depends on this.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod licensing;
pub mod models;
pub mod telemetry;

// Re-export the most commonly used types at the crate root.
pub use catalog::{TierCatalog, TierDefinition};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TierguardConfig;
pub use errors::{TierguardError, TierguardErrorCode, TierguardResult};
pub use licensing::{LicenseIssuer, LicenseTokenPayload, LicenseValidator};
pub use models::{ApiKeyMode, QuotaDecision, Subscription, Tier};
