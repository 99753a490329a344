use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::format::{long, LongDrink};
use crate::database::models::{validate_title, DrinkChanges, Recipe, RecipeInput};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Body of POST /drinks and PATCH /drinks/:id.
/// Both fields are optional here; POST checks presence itself so a missing
/// field is a 422 rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct DrinkPayload {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

fn checked_title(title: String) -> Result<String, ApiError> {
    validate_title(&title).map_err(|reason| {
        debug!("Rejected title {:?}: {}", title, reason);
        ApiError::unprocessable_entity()
    })?;
    Ok(title)
}

/// GET /drinks-detail - every drink in the long representation
pub async fn detail(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> ApiResult<Vec<LongDrink>> {
    let drinks = state
        .store
        .list_all()
        .await
        .map_err(ApiError::from_store_read)?;

    Ok(ApiResponse::drinks(drinks.iter().map(long).collect()))
}

/// POST /drinks - create a drink from `title` and `recipe`
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<DrinkPayload>, JsonRejection>,
) -> ApiResult<LongDrink> {
    let Json(payload) = payload?;

    let (title, recipe) = match (payload.title, payload.recipe) {
        (Some(title), Some(recipe)) => (checked_title(title)?, Recipe::from(recipe)),
        _ => {
            debug!("Create request missing title or recipe");
            return Err(ApiError::unprocessable_entity());
        }
    };

    if state.store.find_by_title(&title).await?.is_some() {
        debug!("Drink title {:?} already exists", title);
        return Err(ApiError::unprocessable_entity());
    }

    // The unique constraint still catches a concurrent insert of the same title
    let drink = state.store.create(&title, &recipe).await?;

    info!(subject = user.subject(), "Created drink {} ({})", drink.id, drink.title);
    Ok(ApiResponse::drinks(long(&drink)))
}

/// PATCH /drinks/:id - update the provided fields of an existing drink
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<DrinkPayload>, JsonRejection>,
) -> ApiResult<Vec<LongDrink>> {
    let Path(id) = id?;

    let existing = state
        .store
        .find_by_id(id)
        .await
        .map_err(ApiError::from_store_write)?
        .ok_or_else(ApiError::not_found)?;

    let Json(payload) = payload?;
    let changes = DrinkChanges {
        title: payload.title.map(checked_title).transpose()?,
        recipe: payload.recipe.map(Recipe::from),
    };

    if changes.is_empty() {
        return Ok(ApiResponse::drinks(vec![long(&existing)]));
    }

    let drink = state
        .store
        .update(id, changes)
        .await
        .map_err(ApiError::from_store_write)?;

    info!(subject = user.subject(), "Updated drink {} ({})", drink.id, drink.title);
    Ok(ApiResponse::drinks(vec![long(&drink)]))
}

/// DELETE /drinks/:id - remove a drink permanently
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<i32> {
    let Path(id) = id?;

    if state
        .store
        .find_by_id(id)
        .await
        .map_err(ApiError::from_store_write)?
        .is_none()
    {
        return Err(ApiError::not_found());
    }

    state
        .store
        .delete(id)
        .await
        .map_err(ApiError::from_store_write)?;

    info!(subject = user.subject(), "Deleted drink {}", id);
    Ok(ApiResponse::new("delete", id))
}
