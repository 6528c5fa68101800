//! Configuration errors, including unknown tier lookups.

use std::path::PathBuf;

use super::error_code::{self, TierguardErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown tier `{name}` (known: trial, free, paid, paid_limited)")]
    UnknownTier { name: String },

    #[error("config file {path} unreadable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid key material for {scheme}: {message}")]
    InvalidKey { scheme: &'static str, message: String },

    #[error("tracing setup failed: {0}")]
    Tracing(String),
}

impl TierguardErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTier { .. } => error_code::UNKNOWN_TIER,
            Self::Io { .. } => error_code::CONFIG_IO,
            Self::TomlParse(_) => error_code::CONFIG_PARSE_ERROR,
            Self::InvalidKey { .. } => error_code::CONFIG_INVALID_KEY,
            Self::Tracing(_) => error_code::CONFIG_TRACING,
        }
    }
}
