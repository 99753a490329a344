use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{permission, TokenVerifier};
use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{method_not_allowed_envelope, require_permission, PermissionGate};
use crate::state::AppState;

/// Build the full HTTP application
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let verifier = state.verifier.clone();

    Router::new()
        // Public
        .route("/", get(public::status::root))
        .route("/health", get(public::status::health))
        // Drinks
        .route(
            "/drinks",
            get(public::drinks::list).merge(protect(
                post(protected::drinks::create),
                &verifier,
                permission::POST_DRINKS,
            )),
        )
        .route(
            "/drinks-detail",
            protect(
                get(protected::drinks::detail),
                &verifier,
                permission::GET_DRINKS_DETAIL,
            ),
        )
        .route(
            "/drinks/:id",
            protect(
                patch(protected::drinks::update),
                &verifier,
                permission::PATCH_DRINKS,
            )
            .merge(protect(
                delete(protected::drinks::delete),
                &verifier,
                permission::DELETE_DRINKS,
            )),
        )
        .fallback(not_found)
        .with_state(state)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.server.max_request_size_bytes))
                .layer(middleware::map_response(method_not_allowed_envelope)),
        )
}

/// Run the permission gate in front of every handler of `route`
fn protect(
    route: MethodRouter<AppState>,
    verifier: &Arc<TokenVerifier>,
    permission: &'static str,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        PermissionGate::new(verifier.clone(), permission),
        require_permission,
    ))
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    if !config.enable_cors {
        return CorsLayer::new();
    }

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    if config.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
