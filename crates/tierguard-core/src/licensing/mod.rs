//! License tokens: signed claims asserting a tier and an expiry.
//!
//! ## Components
//! - **claims**: wire claims and the validated payload
//! - **validator**: signature + claim validation, algorithm taken from the token header
//! - **issuer**: token signing for development, operators and tests
//!
//! ## Schemes
//! - **HS256**: shared secret, development environment only
//! - **RS256**: RSA public key, accepted everywhere

pub mod claims;
pub mod issuer;
pub mod validator;

pub use claims::{LicenseClaims, LicenseTokenPayload, SigningScheme};
pub use issuer::LicenseIssuer;
pub use validator::LicenseValidator;
