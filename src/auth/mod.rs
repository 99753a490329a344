//! Bearer-token verification and permission checks.
//!
//! Tokens are issued by an external identity provider and verified against
//! its published signing keys. Nothing here issues or refreshes tokens.

pub mod header;
pub mod keys;
pub mod verifier;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use header::bearer_token;
pub use keys::{JwksClient, KeySetError, SigningKeys, StaticKeys};
pub use verifier::TokenVerifier;

/// Permission strings carried in the `permissions` claim
pub mod permission {
    pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
    pub const POST_DRINKS: &str = "post:drinks";
    pub const PATCH_DRINKS: &str = "patch:drinks";
    pub const DELETE_DRINKS: &str = "delete:drinks";
}

/// Verified token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    /// Absent when the API has no RBAC grants for this token
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorCode {
    InvalidHeader,
    TokenExpired,
    InvalidClaims,
    Unauthorized,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::InvalidHeader => "invalid_header",
            AuthErrorCode::TokenExpired => "token_expired",
            AuthErrorCode::InvalidClaims => "invalid_claims",
            AuthErrorCode::Unauthorized => "unauthorized",
        }
    }
}

/// A rejected token, with the status the client should see
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .code.as_str(), .description)]
pub struct AuthError {
    pub status: StatusCode,
    pub code: AuthErrorCode,
    pub description: String,
}

impl AuthError {
    pub fn new(status: StatusCode, code: AuthErrorCode, description: impl Into<String>) -> Self {
        Self {
            status,
            code,
            description: description.into(),
        }
    }

    pub fn invalid_header(status: StatusCode, description: impl Into<String>) -> Self {
        Self::new(status, AuthErrorCode::InvalidHeader, description)
    }

    pub fn token_expired() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, AuthErrorCode::TokenExpired, "Token expired.")
    }

    pub fn invalid_claims(status: StatusCode, description: impl Into<String>) -> Self {
        Self::new(status, AuthErrorCode::InvalidClaims, description)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::FORBIDDEN, AuthErrorCode::Unauthorized, "Permission not found.")
    }
}

/// Require `permission` to be granted by the token's `permissions` claim.
pub fn check_permission(claims: &Claims, permission: &str) -> Result<(), AuthError> {
    let granted = claims.permissions.as_ref().ok_or_else(|| {
        AuthError::invalid_claims(StatusCode::BAD_REQUEST, "Permissions not included in JWT.")
    })?;

    if granted.iter().any(|p| p == permission) {
        Ok(())
    } else {
        Err(AuthError::unauthorized())
    }
}
