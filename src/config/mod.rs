use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Identity provider tenant domain, e.g. `my-tenant.us.auth0.com`
    pub domain: Option<String>,
    pub audience: Option<String>,
    /// Overrides `https://<domain>/`
    pub issuer: Option<String>,
    /// Overrides `https://<domain>/.well-known/jwks.json`
    pub jwks_url: Option<String>,
    pub jwks_cache_ttl_secs: u64,
    /// HS256 shared secret accepted instead of the JWKS (development only)
    #[serde(skip_serializing)]
    pub signing_secret: Option<String>,
    pub signing_kid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("DRINKS_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides; a DATABASE_URL implies postgres unless DRINKS_STORE says otherwise
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
            self.database.backend = StoreBackend::Postgres;
        }
        match env::var("DRINKS_STORE").as_deref() {
            Ok("memory") => self.database.backend = StoreBackend::Memory,
            Ok("postgres") => self.database.backend = StoreBackend::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH0_DOMAIN") {
            self.auth.domain = Some(v);
        }
        if let Ok(v) = env::var("API_AUDIENCE") {
            self.auth.audience = Some(v);
        }
        if let Ok(v) = env::var("AUTH_ISSUER") {
            self.auth.issuer = Some(v);
        }
        if let Ok(v) = env::var("AUTH_JWKS_URL") {
            self.auth.jwks_url = Some(v);
        }
        if let Ok(v) = env::var("AUTH_JWKS_CACHE_TTL_SECS") {
            self.auth.jwks_cache_ttl_secs = v.parse().unwrap_or(self.auth.jwks_cache_ttl_secs);
        }
        if let Ok(v) = env::var("AUTH_SIGNING_SECRET") {
            self.auth.signing_secret = Some(v);
        }
        if let Ok(v) = env::var("AUTH_SIGNING_KID") {
            self.auth.signing_kid = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                domain: None,
                audience: None,
                issuer: None,
                jwks_url: None,
                jwks_cache_ttl_secs: 60,
                signing_secret: None,
                signing_kid: "local".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_request_size_bytes: 256 * 1024,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            auth: AuthConfig {
                jwks_cache_ttl_secs: 600,
                ..Self::development().auth
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_request_size_bytes: 64 * 1024,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            auth: AuthConfig {
                jwks_cache_ttl_secs: 3600,
                ..Self::development().auth
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// Check that everything needed to start the server is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.auth.audience.is_none() {
            return Err(ConfigError::Missing("API_AUDIENCE"));
        }
        if self.auth.dev_secret(self.environment).is_none() {
            self.auth.jwks_url()?;
        }
        self.auth.issuer()?;
        Ok(())
    }
}

impl AuthConfig {
    pub fn issuer(&self) -> Result<String, ConfigError> {
        if let Some(issuer) = &self.issuer {
            return Ok(issuer.clone());
        }
        let domain = self.domain.as_deref().ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;
        Ok(format!("https://{}/", domain.trim_end_matches('/')))
    }

    pub fn jwks_url(&self) -> Result<Url, ConfigError> {
        let raw = match &self.jwks_url {
            Some(url) => url.clone(),
            None => {
                let domain = self.domain.as_deref().ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;
                format!("https://{}/.well-known/jwks.json", domain.trim_end_matches('/'))
            }
        };
        Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            name: "AUTH_JWKS_URL",
            reason: e.to_string(),
        })
    }

    /// The shared signing secret, only ever honored in development.
    pub fn dev_secret(&self, environment: Environment) -> Option<&str> {
        match environment {
            Environment::Development => self.signing_secret.as_deref(),
            _ => None,
        }
    }
}
