use anyhow::bail;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, DrinkRepository};

pub async fn handle(yes: bool) -> anyhow::Result<()> {
    if !yes {
        bail!("init-db deletes every stored drink; re-run with --yes to confirm");
    }

    let config = AppConfig::from_env();
    if config.database.backend != StoreBackend::Postgres {
        bail!("init-db needs the postgres store; set DATABASE_URL");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    let drink = DrinkRepository::new(pool).reset().await?;

    println!("✓ Recreated drinks table and seeded '{}' (id {})", drink.title, drink.id);
    Ok(())
}
