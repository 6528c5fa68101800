//! License token signing.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header};

use crate::errors::{ConfigError, LicenseError};
use crate::models::Tier;

use super::claims::{LicenseClaims, SigningScheme};

pub struct LicenseIssuer {
    scheme: SigningScheme,
    key: EncodingKey,
    key_id: Option<String>,
}

impl LicenseIssuer {
    /// Development issuer with a shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            scheme: SigningScheme::Hs256,
            key: EncodingKey::from_secret(secret),
            key_id: None,
        }
    }

    /// Production issuer from an RSA private key in PEM form.
    pub fn rs256_from_pem(pem: &[u8]) -> Result<Self, ConfigError> {
        let key = EncodingKey::from_rsa_pem(pem).map_err(|e| ConfigError::InvalidKey {
            scheme: "RS256",
            message: e.to_string(),
        })?;
        Ok(Self {
            scheme: SigningScheme::Rs256,
            key,
            key_id: None,
        })
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// Sign arbitrary claims. Used directly to mint malformed tokens in tests.
    pub fn issue(&self, claims: &LicenseClaims) -> Result<String, LicenseError> {
        let mut header = Header::new(self.scheme.algorithm());
        header.kid = self.key_id.clone();
        jsonwebtoken::encode(&header, claims, &self.key)
            .map_err(|e| LicenseError::SigningFailed(e.to_string()))
    }

    pub fn issue_license(
        &self,
        tier: Tier,
        license_id: &str,
        issued: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<String, LicenseError> {
        self.issue(&LicenseClaims {
            tier: Some(tier.as_str().to_string()),
            issued: Some(issued.timestamp_millis()),
            expiry: Some(expiry.timestamp_millis()),
            license_id: Some(license_id.to_string()),
            sub: None,
        })
    }
}

impl fmt::Debug for LicenseIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseIssuer")
            .field("scheme", &self.scheme)
            .field("key_id", &self.key_id)
            .finish()
    }
}
