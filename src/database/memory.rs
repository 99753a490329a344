use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::models::{Drink, DrinkChanges, DrinkRow, Recipe};
use crate::database::store::{DrinkStore, StoreError};

/// In-process drink store for development and tests.
///
/// Rows keep the recipe in its encoded text form, the same as the
/// `drinks` table, so reads go through the same decode path.
#[derive(Default)]
pub struct MemoryDrinkStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i32,
    rows: BTreeMap<i32, StoredDrink>,
}

#[derive(Clone)]
struct StoredDrink {
    title: String,
    recipe: String,
}

impl MemoryState {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.rows
            .iter()
            .any(|(id, row)| row.title == title && Some(*id) != except)
    }
}

fn decode(id: i32, row: &StoredDrink) -> Result<Drink, StoreError> {
    DrinkRow {
        id,
        title: row.title.clone(),
        recipe: row.recipe.clone(),
    }
    .decode()
    .map_err(|source| StoreError::Corrupt { id, source })
}

fn duplicate(title: &str) -> StoreError {
    StoreError::ConstraintViolation(format!("title '{}' already exists", title))
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw recipe text as-is, bypassing encoding.
    #[cfg(test)]
    pub(crate) async fn insert_raw(&self, title: &str, recipe: &str) -> i32 {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;
        state.rows.insert(
            id,
            StoredDrink {
                title: title.to_string(),
                recipe: recipe.to_string(),
            },
        );
        id
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        let state = self.state.read().await;
        state.rows.iter().map(|(id, row)| decode(*id, row)).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Drink>, StoreError> {
        let state = self.state.read().await;
        state.rows.get(&id).map(|row| decode(id, row)).transpose()
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Drink>, StoreError> {
        let state = self.state.read().await;
        state
            .rows
            .iter()
            .find(|(_, row)| row.title == title)
            .map(|(id, row)| decode(*id, row))
            .transpose()
    }

    async fn create(&self, title: &str, recipe: &Recipe) -> Result<Drink, StoreError> {
        let mut state = self.state.write().await;
        if state.title_taken(title, None) {
            return Err(duplicate(title));
        }

        // Ids are never reused, even after deletes
        state.last_id += 1;
        let id = state.last_id;
        let row = StoredDrink {
            title: title.to_string(),
            recipe: recipe.encode().map_err(StoreError::Encode)?,
        };
        let drink = decode(id, &row)?;
        state.rows.insert(id, row);
        Ok(drink)
    }

    async fn update(&self, id: i32, changes: DrinkChanges) -> Result<Drink, StoreError> {
        let recipe = changes
            .recipe
            .map(|r| r.encode().map_err(StoreError::Encode))
            .transpose()?;

        let mut state = self.state.write().await;
        if let Some(title) = &changes.title {
            if state.title_taken(title, Some(id)) {
                return Err(duplicate(title));
            }
        }

        let row = state.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(recipe) = recipe {
            row.recipe = recipe;
        }
        decode(id, row)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
