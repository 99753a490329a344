use anyhow::Context;
use jsonwebtoken::Algorithm;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::{JwksClient, SigningKeys, StaticKeys, TokenVerifier};
use crate::config::{AppConfig, ConfigError, StoreBackend};
use crate::database::{DatabaseManager, DrinkRepository, DrinkStore, MemoryDrinkStore};
use crate::state::AppState;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    info!("Starting Drinks API in {:?} mode", config.environment);

    let store = build_store(&config).await?;
    let verifier = build_verifier(&config)?;
    let app = crate::app(AppState::new(store, verifier), &config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Drinks API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Drinks API stopped");
    Ok(())
}

pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DrinkStore>> {
    match config.database.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory drink store; data is lost on exit");
            Ok(Arc::new(MemoryDrinkStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            let repository = DrinkRepository::new(pool);
            repository.ensure_schema().await?;
            Ok(Arc::new(repository))
        }
    }
}

pub fn build_verifier(config: &AppConfig) -> anyhow::Result<Arc<TokenVerifier>> {
    let auth = &config.auth;
    let audience = auth
        .audience
        .clone()
        .ok_or(ConfigError::Missing("API_AUDIENCE"))?;
    let issuer = auth.issuer()?;

    let verifier = match auth.dev_secret(config.environment) {
        Some(secret) => {
            warn!(
                "Verifying tokens with the shared development secret (kid {})",
                auth.signing_kid
            );
            let keys: Arc<dyn SigningKeys> =
                Arc::new(StaticKeys::shared_secret(auth.signing_kid.clone(), secret.as_bytes()));
            TokenVerifier::new(keys, Algorithm::HS256, audience, issuer)
        }
        None => {
            let url = auth.jwks_url()?;
            info!("Verifying tokens against {}", url);
            let keys: Arc<dyn SigningKeys> = Arc::new(JwksClient::new(
                url,
                Duration::from_secs(auth.jwks_cache_ttl_secs),
            )?);
            TokenVerifier::new(keys, Algorithm::RS256, audience, issuer)
        }
    };

    Ok(Arc::new(verifier))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
