use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{bearer_token, check_permission, Claims, TokenVerifier};
use crate::error::ApiError;

/// Authenticated caller, injected for the handler after the gate passes
#[derive(Clone, Debug)]
pub struct AuthUser {
    subject: Option<String>,
}

impl AuthUser {
    /// Token subject for audit logs, `-` when the token carries none
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("-")
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { subject: claims.sub }
    }
}

/// Gate state for one protected route: the verifier plus the permission it demands
#[derive(Clone)]
pub struct PermissionGate {
    verifier: Arc<TokenVerifier>,
    permission: &'static str,
}

impl PermissionGate {
    pub fn new(verifier: Arc<TokenVerifier>, permission: &'static str) -> Self {
        Self {
            verifier,
            permission,
        }
    }
}

/// Middleware that validates the bearer token and the route's permission,
/// then injects `AuthUser` into the request
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).map_err(|e| {
        tracing::warn!("Rejected request for {}: {}", gate.permission, e);
        e
    })?;

    let claims = gate.verifier.verify(token).await.map_err(|e| {
        let api_error = ApiError::from(e);
        tracing::warn!("Token rejected for {}: {}", gate.permission, api_error);
        api_error
    })?;

    if let Err(e) = check_permission(&claims, gate.permission) {
        tracing::warn!(
            subject = claims.sub.as_deref().unwrap_or("-"),
            "Permission {} denied: {}",
            gate.permission,
            e
        );
        return Err(e.into());
    }

    tracing::debug!(
        subject = claims.sub.as_deref().unwrap_or("-"),
        "Permission {} granted",
        gate.permission
    );
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
