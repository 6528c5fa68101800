//! Errors reported by external collaborators (notification sink, document registry).
//! Callers log these; they never reverse a decision already made.

use super::error_code::{self, TierguardErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document registry unavailable: {0}")]
    Unavailable(String),
}

impl TierguardErrorCode for NotificationError {
    fn error_code(&self) -> &'static str {
        error_code::NOTIFICATION_FAILED
    }
}

impl TierguardErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => error_code::DOCUMENT_NOT_FOUND,
            Self::Unavailable(_) => error_code::REGISTRY_UNAVAILABLE,
        }
    }
}
