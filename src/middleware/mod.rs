pub mod auth;
pub mod response;

pub use auth::{require_permission, AuthUser, PermissionGate};
pub use response::{method_not_allowed_envelope, ApiResponse, ApiResult};
