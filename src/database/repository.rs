use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Drink, DrinkChanges, DrinkRow, Ingredient, Recipe};
use crate::database::store::{DrinkStore, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS drinks (
        id SERIAL PRIMARY KEY,
        title VARCHAR(80) NOT NULL UNIQUE,
        recipe TEXT NOT NULL
    )
"#;

/// PostgreSQL-backed drink store over the `drinks` table
#[derive(Clone)]
pub struct DrinkRepository {
    pool: PgPool,
}

impl DrinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table when it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Drop and recreate the table, then seed the sample drink.
    /// Every existing record is lost.
    pub async fn reset(&self) -> Result<Drink, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        sqlx::query("DROP TABLE IF EXISTS drinks")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        sqlx::query(CREATE_TABLE)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;

        info!("Recreated drinks table");
        self.create("water", &sample_recipe()).await
    }

    fn decode(row: DrinkRow) -> Result<Drink, StoreError> {
        let id = row.id;
        row.decode().map_err(|source| {
            error!("Drink {} has an undecodable recipe: {}", id, source);
            StoreError::Corrupt { id, source }
        })
    }
}

/// The drink seeded by `reset`
pub fn sample_recipe() -> Recipe {
    Recipe(vec![Ingredient {
        color: "blue".to_string(),
        name: "water".to_string(),
        parts: 1,
    }])
}

/// SQLSTATE classes 22 (data exception) and 23 (integrity constraint) are
/// rejections of the written values, everything else is a database failure.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if code.starts_with("23") || code.starts_with("22") {
                return StoreError::ConstraintViolation(db_err.message().to_string());
            }
        }
    }
    StoreError::Database(err.to_string())
}

#[async_trait]
impl DrinkStore for DrinkRepository {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter().map(Self::decode).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Drink>, StoreError> {
        sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .map(Self::decode)
            .transpose()
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Drink>, StoreError> {
        sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks WHERE title = $1")
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .map(Self::decode)
            .transpose()
    }

    async fn create(&self, title: &str, recipe: &Recipe) -> Result<Drink, StoreError> {
        let encoded = recipe.encode().map_err(StoreError::Encode)?;
        let row = sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(title)
        .bind(encoded)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Self::decode(row)
    }

    async fn update(&self, id: i32, changes: DrinkChanges) -> Result<Drink, StoreError> {
        let recipe = changes
            .recipe
            .map(|r| r.encode().map_err(StoreError::Encode))
            .transpose()?;
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drinks
            SET title = COALESCE($2, title),
                recipe = COALESCE($3, recipe)
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(recipe)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or(StoreError::NotFound(id))?;

        Self::decode(row)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
