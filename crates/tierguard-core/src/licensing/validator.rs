//! License token validation.
//! The algorithm comes from the token's own header; callers cannot pick it.
//! Every accepted token has its signature verified.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation};
use tracing::debug;

use crate::clock::Clock;
use crate::config::{LicenseConfig, LicenseEnvironment};
use crate::errors::{ConfigError, LicenseError};
use crate::models::{Subscription, Tier};

use super::claims::{LicenseClaims, LicenseTokenPayload, SigningScheme};

pub struct LicenseValidator {
    environment: LicenseEnvironment,
    hmac_key: Option<DecodingKey>,
    rsa_key: Option<DecodingKey>,
    clock: Arc<dyn Clock>,
}

impl LicenseValidator {
    /// A validator with no keys; add them with the `with_*` builders.
    pub fn new(environment: LicenseEnvironment, clock: Arc<dyn Clock>) -> Self {
        Self {
            environment,
            hmac_key: None,
            rsa_key: None,
            clock,
        }
    }

    /// Build from config. Inline PEM wins over a key path.
    pub fn from_config(config: &LicenseConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let mut validator = Self::new(config.environment, clock);
        if let Some(secret) = &config.hmac_secret {
            validator = validator.with_hmac_secret(secret.as_bytes());
        }
        if let Some(pem) = &config.rsa_public_key_pem {
            validator = validator.with_rsa_public_pem(pem.as_bytes())?;
        } else if let Some(path) = &config.rsa_public_key_path {
            let pem = std::fs::read(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            validator = validator.with_rsa_public_pem(&pem)?;
        }
        Ok(validator)
    }

    pub fn with_hmac_secret(mut self, secret: &[u8]) -> Self {
        self.hmac_key = Some(DecodingKey::from_secret(secret));
        self
    }

    pub fn with_rsa_public_pem(mut self, pem: &[u8]) -> Result<Self, ConfigError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| ConfigError::InvalidKey {
            scheme: "RS256",
            message: e.to_string(),
        })?;
        self.rsa_key = Some(key);
        Ok(self)
    }

    pub fn environment(&self) -> LicenseEnvironment {
        self.environment
    }

    /// Verify a token and return its payload.
    ///
    /// Fails on a bad signature, a missing `tier`/`issued`/`expiry`/`license_id`,
    /// an expiry at or before now, or an unknown tier.
    pub fn validate(&self, token: &str) -> Result<LicenseTokenPayload, LicenseError> {
        let token = token.trim();
        let header =
            jsonwebtoken::decode_header(token).map_err(|e| LicenseError::Malformed(e.to_string()))?;

        let scheme = SigningScheme::from_algorithm(header.alg).ok_or_else(|| {
            LicenseError::AlgorithmNotAllowed {
                algorithm: format!("{:?}", header.alg),
                reason: "only HS256 and RS256 are supported".to_string(),
            }
        })?;

        if scheme.is_symmetric() && self.environment == LicenseEnvironment::Production {
            return Err(LicenseError::AlgorithmNotAllowed {
                algorithm: scheme.as_str().to_string(),
                reason: "symmetric tokens are not accepted in production".to_string(),
            });
        }

        let key = match scheme {
            SigningScheme::Hs256 => self.hmac_key.as_ref(),
            SigningScheme::Rs256 => self.rsa_key.as_ref(),
        }
        .ok_or(LicenseError::KeyNotConfigured {
            scheme: scheme.as_str(),
        })?;

        // Expiry is a custom millisecond claim, checked below.
        let mut validation = Validation::new(scheme.algorithm());
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<LicenseClaims>(token, key, &validation)
            .map_err(map_jwt_error)?;
        let claims = data.claims;

        let tier_name = claims.tier.ok_or(LicenseError::MissingField("tier"))?;
        let issued_ms = claims.issued.ok_or(LicenseError::MissingField("issued"))?;
        let expiry_ms = claims.expiry.ok_or(LicenseError::MissingField("expiry"))?;
        let license_id = claims
            .license_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(LicenseError::MissingField("license_id"))?;

        let now_ms = self.clock.now().timestamp_millis();
        if expiry_ms <= now_ms {
            return Err(LicenseError::Expired {
                expired_at_ms: expiry_ms,
                now_ms,
            });
        }

        let tier = Tier::parse(&tier_name).ok_or(LicenseError::UnknownTier(tier_name))?;

        let payload = LicenseTokenPayload {
            tier,
            issued_ms,
            expiry_ms,
            license_id,
            licensee: claims.sub,
            algorithm: scheme,
            key_id: header.kid,
        };
        if payload.issued_at().is_none() || payload.expires_at().is_none() {
            return Err(LicenseError::Malformed(
                "timestamp out of representable range".to_string(),
            ));
        }

        debug!(
            license_id = %payload.license_id,
            tier = %payload.tier,
            algorithm = payload.algorithm.as_str(),
            "license token verified"
        );
        Ok(payload)
    }

    /// Map a verified payload onto subscription fields.
    ///
    /// Trial tokens fill the trial window, paid_limited tokens fill the grace
    /// window, other tiers carry no window.
    pub fn extract_subscription(&self, payload: &LicenseTokenPayload) -> Subscription {
        let mut subscription = Subscription::new_trial();
        subscription.tier = payload.tier;
        match payload.tier {
            Tier::Trial => {
                subscription.trial_started_at = payload.issued_at();
                subscription.trial_expires_at = payload.expires_at();
            }
            Tier::PaidLimited => {
                subscription.grace_period_started_at = payload.issued_at();
                subscription.grace_period_expires_at = payload.expires_at();
            }
            Tier::Free | Tier::Paid => {}
        }
        subscription.last_tier_change = Some(self.clock.now());
        subscription
    }
}

impl fmt::Debug for LicenseValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseValidator")
            .field("environment", &self.environment)
            .field("hmac_key", &self.hmac_key.is_some())
            .field("rsa_key", &self.rsa_key.is_some())
            .finish()
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> LicenseError {
    match err.kind() {
        ErrorKind::InvalidSignature => LicenseError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm => LicenseError::AlgorithmNotAllowed {
            algorithm: "mismatched".to_string(),
            reason: err.to_string(),
        },
        _ => LicenseError::Malformed(err.to_string()),
    }
}
