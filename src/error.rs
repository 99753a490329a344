// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::verifier::VerifyError;
use crate::auth::{AuthError, AuthErrorCode};
use crate::database::StoreError;

/// HTTP API error, rendered as `{"success": false, "error": <status>, "message": ...}`
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 422 Unprocessable Entity
    UnprocessableEntity(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    // 400/401/403 from the authorization gate
    Auth(AuthError),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(err) => err.status,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Auth(err) => &err.description,
        }
    }

    /// Machine-readable code, only for authorization failures
    pub fn auth_code(&self) -> Option<AuthErrorCode> {
        match self {
            ApiError::Auth(err) => Some(err.code),
            _ => None,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.status_code().as_u16(),
            "message": self.message(),
        });

        if let Some(code) = self.auth_code() {
            response["code"] = json!(code.as_str());
        }

        response
    }
}

// Static constructor methods carrying the default client messages
impl ApiError {
    pub fn bad_request() -> Self {
        ApiError::BadRequest("Bad request".to_string())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("Resource not found".to_string())
    }

    pub fn method_not_allowed() -> Self {
        ApiError::MethodNotAllowed("Method not allowed".to_string())
    }

    pub fn unprocessable_entity() -> Self {
        ApiError::UnprocessableEntity("Unprocessable entity".to_string())
    }

    pub fn internal_server_error() -> Self {
        ApiError::InternalServerError("Internal server error".to_string())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Store failure while listing: reported as 404
    pub fn from_store_read(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt { .. } | StoreError::Encode(_) => err.into(),
            other => {
                tracing::error!("Failed to read drinks: {}", other);
                ApiError::not_found()
            }
        }
    }

    /// Store failure while updating or deleting an existing record:
    /// storage failures other than a missing record are reported as 422
    pub fn from_store_write(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found(),
            StoreError::Corrupt { .. } | StoreError::Encode(_) => err.into(),
            other => {
                tracing::warn!("Drink write rejected: {}", other);
                ApiError::unprocessable_entity()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found(),
            StoreError::ConstraintViolation(msg) => {
                tracing::warn!("Drink write rejected: {}", msg);
                ApiError::unprocessable_entity()
            }
            StoreError::Corrupt { id, source } => {
                // Don't expose stored data details to clients
                tracing::error!("Corrupt recipe for drink {}: {}", id, source);
                ApiError::internal_server_error()
            }
            StoreError::Encode(e) => {
                tracing::error!("Failed to encode recipe: {}", e);
                ApiError::internal_server_error()
            }
            StoreError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ApiError::internal_server_error()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Rejected(auth) => ApiError::Auth(auth),
            VerifyError::KeySet(e) => {
                tracing::error!("Signing keys unavailable: {}", e);
                ApiError::internal_server_error()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        match rejection {
            // Valid JSON that does not fit the expected shape
            JsonRejection::JsonDataError(_) => ApiError::unprocessable_entity(),
            _ => ApiError::bad_request(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        // A path id that is not an integer cannot name an existing drink
        tracing::debug!("Rejected path: {}", rejection.body_text());
        ApiError::not_found()
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
