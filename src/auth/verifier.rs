use axum::http::StatusCode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;

use super::keys::{KeySetError, SigningKeys};
use super::{AuthError, Claims};

/// Why a token could not be verified
#[derive(Debug)]
pub enum VerifyError {
    /// The token itself was rejected
    Rejected(AuthError),
    /// The signing keys could not be obtained
    KeySet(KeySetError),
}

impl From<AuthError> for VerifyError {
    fn from(err: AuthError) -> Self {
        VerifyError::Rejected(err)
    }
}

/// Verifies signature, expiry, audience and issuer of bearer tokens
pub struct TokenVerifier {
    keys: Arc<dyn SigningKeys>,
    algorithm: Algorithm,
    audience: String,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(
        keys: Arc<dyn SigningKeys>,
        algorithm: Algorithm,
        audience: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            keys,
            algorithm,
            audience: audience.into(),
            issuer: issuer.into(),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token).map_err(|_| unparseable())?;

        let kid = header.kid.ok_or_else(|| {
            AuthError::invalid_header(StatusCode::UNAUTHORIZED, "Authorization malformed.")
        })?;

        let key = match self.keys.key(&kid).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                return Err(AuthError::invalid_header(
                    StatusCode::UNAUTHORIZED,
                    "Unable to find the appropriate key.",
                )
                .into())
            }
            Err(KeySetError::InvalidKey(e)) => {
                tracing::warn!("Signing key {} is unusable: {}", kid, e);
                return Err(unparseable().into());
            }
            Err(e) => return Err(VerifyError::KeySet(e)),
        };

        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::token_expired(),
            ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::invalid_claims(
                StatusCode::UNAUTHORIZED,
                "Incorrect claims. Please, check the audience and issuer.",
            ),
            _ => unparseable(),
        })?;

        Ok(data.claims)
    }
}

fn unparseable() -> AuthError {
    AuthError::invalid_header(StatusCode::BAD_REQUEST, "Unable to parse authentication token.")
}
