//! License token errors. Every variant is an "invalid license" outcome.

use super::error_code::{self, TierguardErrorCode};

/// Why a license token was rejected.
#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    #[error("invalid license: malformed token: {0}")]
    Malformed(String),

    #[error("invalid license: signature verification failed")]
    SignatureInvalid,

    #[error("invalid license: algorithm {algorithm} is not accepted ({reason})")]
    AlgorithmNotAllowed { algorithm: String, reason: String },

    #[error("invalid license: no {scheme} key configured")]
    KeyNotConfigured { scheme: &'static str },

    #[error("invalid license: missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid license: token expired at {expired_at_ms} (now {now_ms})")]
    Expired { expired_at_ms: i64, now_ms: i64 },

    #[error("invalid license: unknown tier `{0}`")]
    UnknownTier(String),

    #[error("invalid license: signing failed: {0}")]
    SigningFailed(String),
}

impl TierguardErrorCode for LicenseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => error_code::LICENSE_MALFORMED,
            Self::SignatureInvalid => error_code::LICENSE_SIGNATURE_INVALID,
            Self::AlgorithmNotAllowed { .. } => error_code::LICENSE_ALGORITHM_NOT_ALLOWED,
            Self::KeyNotConfigured { .. } => error_code::LICENSE_KEY_NOT_CONFIGURED,
            Self::MissingField(_) => error_code::LICENSE_MISSING_FIELD,
            Self::Expired { .. } => error_code::LICENSE_EXPIRED,
            Self::UnknownTier(_) => error_code::LICENSE_UNKNOWN_TIER,
            Self::SigningFailed(_) => error_code::LICENSE_SIGNING_FAILED,
        }
    }
}
