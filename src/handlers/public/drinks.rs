use axum::extract::State;

use crate::api::format::{short, ShortDrink};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /drinks - every drink in the short (public) representation
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ShortDrink>> {
    let drinks = state
        .store
        .list_all()
        .await
        .map_err(ApiError::from_store_read)?;

    Ok(ApiResponse::drinks(drinks.iter().map(short).collect()))
}
