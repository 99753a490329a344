use axum::{
    http::{header::ALLOW, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;

/// Success envelope `{"success": true, <key>: <data>}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub key: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(key: &'static str, data: T) -> Self {
        Self { key, data }
    }

    /// `{"success": true, "drinks": ...}`
    pub fn drinks(data: T) -> Self {
        Self::new("drinks", data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error().into_response();
            }
        };

        let mut envelope = Map::new();
        envelope.insert("success".to_string(), json!(true));
        envelope.insert(self.key.to_string(), data_value);

        (StatusCode::OK, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Replace axum's empty 405 bodies with the uniform error envelope
pub async fn method_not_allowed_envelope(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let mut replaced = ApiError::method_not_allowed().into_response();
    // Keep the Allow header axum computed for the route
    if let Some(allow) = response.headers().get(ALLOW) {
        replaced.headers_mut().insert(ALLOW, allow.clone());
    }
    replaced
}
