//! Stable error codes shared by every Tierguard error type.
//!
//! Codes are part of the public contract: callers match on them, logs index
//! them. Never rename one.

/// A machine-readable code for an error.
pub trait TierguardErrorCode {
    fn error_code(&self) -> &'static str;
}

// ---- license ----
pub const LICENSE_MALFORMED: &str = "LICENSE_MALFORMED";
pub const LICENSE_SIGNATURE_INVALID: &str = "LICENSE_SIGNATURE_INVALID";
pub const LICENSE_ALGORITHM_NOT_ALLOWED: &str = "LICENSE_ALGORITHM_NOT_ALLOWED";
pub const LICENSE_KEY_NOT_CONFIGURED: &str = "LICENSE_KEY_NOT_CONFIGURED";
pub const LICENSE_MISSING_FIELD: &str = "LICENSE_MISSING_FIELD";
pub const LICENSE_EXPIRED: &str = "LICENSE_EXPIRED";
pub const LICENSE_UNKNOWN_TIER: &str = "LICENSE_UNKNOWN_TIER";
pub const LICENSE_SIGNING_FAILED: &str = "LICENSE_SIGNING_FAILED";

// ---- storage ----
pub const STORAGE_IO: &str = "STORAGE_IO";
pub const STORAGE_CORRUPT: &str = "STORAGE_CORRUPT";
pub const STORAGE_SERIALIZE: &str = "STORAGE_SERIALIZE";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const UNSUPPORTED_SCHEMA_VERSION: &str = "UNSUPPORTED_SCHEMA_VERSION";

// ---- config ----
pub const UNKNOWN_TIER: &str = "UNKNOWN_TIER";
pub const CONFIG_IO: &str = "CONFIG_IO";
pub const CONFIG_PARSE_ERROR: &str = "CONFIG_PARSE_ERROR";
pub const CONFIG_INVALID_KEY: &str = "CONFIG_INVALID_KEY";
pub const CONFIG_TRACING: &str = "CONFIG_TRACING";

// ---- collaborators ----
pub const NOTIFICATION_FAILED: &str = "NOTIFICATION_FAILED";
pub const DOCUMENT_NOT_FOUND: &str = "DOCUMENT_NOT_FOUND";
pub const REGISTRY_UNAVAILABLE: &str = "REGISTRY_UNAVAILABLE";

pub const WORKER_UNAVAILABLE: &str = "WORKER_UNAVAILABLE";
