// handlers/protected/mod.rs - Protected handlers (bearer token + permission required)
//
// Every route here is wrapped in `middleware::require_permission`, which
// verifies the token, checks the route's permission and injects `AuthUser`.

pub mod drinks;
