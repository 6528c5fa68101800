use super::error_code::{self, TierguardErrorCode};
use super::{ConfigError, LicenseError, NotificationError, RegistryError, StorageError};

/// Top-level error type for Tierguard.
/// All subsystem errors convert into this via `From` impls.
/// Quota denials are not errors; see [`crate::models::QuotaDecision`].
#[derive(Debug, thiserror::Error)]
pub enum TierguardError {
    #[error(transparent)]
    InvalidLicense(#[from] LicenseError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("document registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("worker unavailable: {0}")]
    WorkerUnavailable(String),
}

impl TierguardErrorCode for TierguardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLicense(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
            Self::Notification(e) => e.error_code(),
            Self::Registry(e) => e.error_code(),
            Self::WorkerUnavailable(_) => error_code::WORKER_UNAVAILABLE,
        }
    }
}

/// Convenience type alias.
pub type TierguardResult<T> = Result<T, TierguardError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn umbrella_reports_the_inner_code() {
        let corrupt = TierguardError::from(StorageError::Corrupt {
            path: PathBuf::from("usage.json"),
            details: "eof".to_string(),
        });
        assert_eq!(corrupt.error_code(), error_code::STORAGE_CORRUPT);

        let expired = TierguardError::from(LicenseError::Expired {
            expired_at_ms: 1,
            now_ms: 2,
        });
        assert_eq!(expired.error_code(), error_code::LICENSE_EXPIRED);

        let sink = TierguardError::from(NotificationError::Delivery("down".to_string()));
        assert_eq!(sink.error_code(), error_code::NOTIFICATION_FAILED);

        let worker = TierguardError::WorkerUnavailable("stopped".to_string());
        assert_eq!(worker.error_code(), "WORKER_UNAVAILABLE");
    }
}
