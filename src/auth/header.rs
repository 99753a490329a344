use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};

use super::AuthError;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let invalid = |description: &str| AuthError::invalid_header(StatusCode::UNAUTHORIZED, description);

    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| invalid("Authorization header is expected."))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| invalid("Authorization header must be bearer token."))?;

    let mut parts = auth_str.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), _, _) if !scheme.eq_ignore_ascii_case("bearer") => {
            Err(invalid("Authorization header must start with \"Bearer\"."))
        }
        (Some(_), Some(token), None) => Ok(token),
        (Some(_), None, _) => Err(invalid("Token not found.")),
        (Some(_), Some(_), Some(_)) => Err(invalid("Authorization header must be bearer token.")),
        (None, _, _) => Err(invalid("Authorization header is expected.")),
    }
}
