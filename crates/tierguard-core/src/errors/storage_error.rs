//! Storage-layer errors for the persisted usage and subscription documents.

use std::path::PathBuf;

use super::error_code::{self, TierguardErrorCode};

/// Errors that can occur while reading, migrating or writing a store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store corrupt at {path}: {details}")]
    Corrupt { path: PathBuf, details: String },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("migration to v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("unsupported schema version {found} (latest known: {latest})")]
    UnsupportedVersion { found: u32, latest: u32 },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl TierguardErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::STORAGE_IO,
            Self::Corrupt { .. } => error_code::STORAGE_CORRUPT,
            Self::Serialize(_) => error_code::STORAGE_SERIALIZE,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::UnsupportedVersion { .. } => error_code::UNSUPPORTED_SCHEMA_VERSION,
        }
    }
}
