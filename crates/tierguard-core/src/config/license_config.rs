//! License verification key configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which signing schemes are accepted.
/// Production accepts only RS256; development also accepts HS256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseEnvironment {
    Development,
    #[default]
    Production,
}

/// Key material can be given inline or as a file path; inline wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub environment: LicenseEnvironment,
    /// Shared secret for HS256 development tokens.
    pub hmac_secret: Option<String>,
    /// RSA public key (PEM) for RS256 production tokens.
    pub rsa_public_key_pem: Option<String>,
    pub rsa_public_key_path: Option<PathBuf>,
}
