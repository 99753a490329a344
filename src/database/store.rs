use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::{Drink, DrinkChanges, Recipe};

/// Errors from a `DrinkStore`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Drink {0} not found")]
    NotFound(i32),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Stored recipe for drink {id} cannot be decoded: {source}")]
    Corrupt {
        id: i32,
        #[source]
        source: serde_json::Error,
    },

    #[error("Recipe cannot be encoded for storage: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),
}

/// Persistent drink records. Every mutation commits before returning.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// Every drink, ordered by id.
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Drink>, StoreError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<Drink>, StoreError>;

    /// Insert a drink and return it with its generated id.
    /// Fails with `ConstraintViolation` when the title is taken.
    async fn create(&self, title: &str, recipe: &Recipe) -> Result<Drink, StoreError>;

    /// Apply the provided fields only.
    async fn update(&self, id: i32, changes: DrinkChanges) -> Result<Drink, StoreError>;

    async fn delete(&self, id: i32) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
