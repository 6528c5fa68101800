pub mod error_code;

mod collaborator_error;
mod config_error;
mod license_error;
mod storage_error;
mod tierguard_error;

pub use collaborator_error::{NotificationError, RegistryError};
pub use config_error::ConfigError;
pub use error_code::TierguardErrorCode;
pub use license_error::LicenseError;
pub use storage_error::StorageError;
pub use tierguard_error::{TierguardError, TierguardResult};
