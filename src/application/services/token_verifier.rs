//! Local bearer token verification.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;

use crate::domain::Claims;
use crate::error::AuthFailure;

/// Why a credential failed local verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("token cannot be parsed")]
    Malformed,

    #[error("token signature is valid but the token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,
}

impl From<VerificationError> for AuthFailure {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Malformed => AuthFailure::Malformed,
            VerificationError::Expired => AuthFailure::Expired,
            VerificationError::InvalidSignature => AuthFailure::InvalidSignature,
        }
    }
}

/// Verifies HS256 tokens signed with the shared gateway secret.
///
/// Verification is a pure function of the token and the secret: no I/O and no
/// shared mutable state, so one instance is shared across all requests.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Checks signature and expiry and returns the decoded claims.
    ///
    /// # Errors
    ///
    /// - [`VerificationError::Malformed`] if the token is not a decodable JWT
    ///   with the expected claims
    /// - [`VerificationError::Expired`] if the signature matches but `exp` has passed
    /// - [`VerificationError::InvalidSignature`] if the signature does not match,
    ///   or the token uses an algorithm or `nbf` the gateway does not accept
    pub fn verify(&self, credential: &str) -> Result<Claims, VerificationError> {
        decode::<Claims>(credential, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))
    }
}

fn classify(kind: &ErrorKind) -> VerificationError {
    match kind {
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::ImmatureSignature => {
            VerificationError::InvalidSignature
        }
        _ => VerificationError::Malformed,
    }
}
