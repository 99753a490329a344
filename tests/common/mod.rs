#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use drinks_api::auth::{StaticKeys, TokenVerifier};
use drinks_api::config::AppConfig;
use drinks_api::database::{
    Drink, DrinkChanges, DrinkStore, MemoryDrinkStore, Recipe, StoreError,
};
use drinks_api::AppState;

pub const SECRET: &str = "integration-test-secret";
pub const KID: &str = "test-key";
pub const AUDIENCE: &str = "drinks";
pub const ISSUER: &str = "https://drinks-test.example/";

pub const ALL_PERMISSIONS: &[&str] = &[
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];

/// Claims accepted by the test verifier, expiring in an hour
pub fn claims(permissions: &[&str]) -> Value {
    json!({
        "sub": "auth0|test-barista",
        "aud": AUDIENCE,
        "iss": ISSUER,
        "iat": chrono::Utc::now().timestamp(),
        "exp": chrono::Utc::now().timestamp() + 3600,
        "permissions": permissions,
    })
}

/// Sign arbitrary claims with the test key
pub fn sign(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &EncodingKey::from_secret(SECRET.as_bytes())).expect("sign test token")
}

pub fn token(permissions: &[&str]) -> String {
    sign(&claims(permissions))
}

/// In-process application over an in-memory store
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryDrinkStore::new()))
    }

    /// HS256 test verifier over any store
    pub fn with_store(store: Arc<dyn DrinkStore>) -> Self {
        let verifier = Arc::new(TokenVerifier::new(
            Arc::new(StaticKeys::shared_secret(KID, SECRET.as_bytes())),
            Algorithm::HS256,
            AUDIENCE,
            ISSUER,
        ));
        Self::with_store_and_verifier(store, verifier)
    }

    pub fn with_store_and_verifier(store: Arc<dyn DrinkStore>, verifier: Arc<TokenVerifier>) -> Self {
        let router = drinks_api::app(AppState::new(store, verifier), &AppConfig::development());
        Self { router }
    }

    /// Send a request with an optional raw Authorization header value and JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<String>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.send(Method::GET, uri, auth.as_deref(), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.send(Method::POST, uri, auth.as_deref(), Some(body.to_string())).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.send(Method::PATCH, uri, auth.as_deref(), Some(body.to_string())).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.send(Method::DELETE, uri, auth.as_deref(), None).await
    }

    /// Create a drink with every permission, returning its long view
    pub async fn create_drink(&self, title: &str, recipe: Value) -> Result<Value> {
        let admin = token(ALL_PERMISSIONS);
        let (status, body) = self
            .post("/drinks", Some(admin.as_str()), json!({ "title": title, "recipe": recipe }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "create failed with {}: {}", status, body);
        Ok(body["drinks"].clone())
    }
}

/// How a `FailingStore` fails
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Storage unreachable
    Database,
    /// A stored recipe that no longer decodes
    Corrupt,
}

/// Store whose every operation fails the same way
pub struct FailingStore {
    failure: Failure,
}

impl FailingStore {
    pub fn new(failure: Failure) -> Self {
        Self { failure }
    }

    fn error(&self) -> StoreError {
        match self.failure {
            Failure::Database => StoreError::Database("connection refused".to_string()),
            Failure::Corrupt => StoreError::Corrupt {
                id: 1,
                source: serde_json::from_str::<Value>("[{").unwrap_err(),
            },
        }
    }
}

#[async_trait]
impl DrinkStore for FailingStore {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        Err(self.error())
    }

    async fn find_by_id(&self, _id: i32) -> Result<Option<Drink>, StoreError> {
        Err(self.error())
    }

    async fn find_by_title(&self, _title: &str) -> Result<Option<Drink>, StoreError> {
        Err(self.error())
    }

    async fn create(&self, _title: &str, _recipe: &Recipe) -> Result<Drink, StoreError> {
        Err(self.error())
    }

    async fn update(&self, _id: i32, _changes: DrinkChanges) -> Result<Drink, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _id: i32) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(self.error())
    }
}

pub fn water_recipe() -> Value {
    json!([{ "color": "blue", "name": "water", "parts": 1 }])
}

/// The real binary, listening on a free port with the in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_drinks-api"));
        cmd.arg("serve")
            .env("APP_ENV", "development")
            .env("DRINKS_STORE", "memory")
            .env("SERVER_HOST", "127.0.0.1")
            .env("DRINKS_API_PORT", port.to_string())
            .env("API_AUDIENCE", AUDIENCE)
            .env("AUTH_ISSUER", ISSUER)
            .env("AUTH_SIGNING_SECRET", SECRET)
            .env("AUTH_SIGNING_KID", KID)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
