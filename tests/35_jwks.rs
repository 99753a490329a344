mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use url::Url;

use drinks_api::auth::{JwksClient, TokenVerifier};
use drinks_api::database::MemoryDrinkStore;

use common::{claims, TestApp, ALL_PERMISSIONS, AUDIENCE, ISSUER};

const SIGNING_KEY: &str = include_str!("fixtures/rs256_signing_key.pem");
const KID: &str = "signing-1";
const MODULUS: &str = "0C5em8IA-z8E181b4lzy2mwzqQYVPD9M_UUlhvCUVnDQ4QGBRvQ9BY2xEKp_YGyn4z_9hfvpRUPDGcZlgRmrvJdPU5H_hg9njEHwFBMbxUx1gbCNY4VlHz9oPdwipm4xS-KJgcPRZOMQVHQZnW7sRAS24l-tc64MsslRwwu18_pRPSrVvgV3Jo67HRlv5_XUYHVwj1gFBAAAZvZ81Yfje9w83USrWMgJ9fAx5xBfLTH87OEbKPQelzJJLBtsGG93VwK-T6mC0GWT92OKb_adCydJPqSY_7BPt12ect-Xj0menl_eKKARR0XXnZpoisGUGn68ZNsY_T0luWQUfJMjvQ";

/// Identity provider stand-in publishing one RS256 key
struct Provider {
    fetches: AtomicUsize,
    down: AtomicBool,
}

async fn key_set(State(provider): State<Arc<Provider>>) -> Response {
    provider.fetches.fetch_add(1, Ordering::SeqCst);
    if provider.down.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(json!({
        "keys": [{
            "kty": "RSA",
            "kid": KID,
            "use": "sig",
            "alg": "RS256",
            "n": MODULUS,
            "e": "AQAB"
        }]
    }))
    .into_response()
}

/// Serve the key set on a free local port, returning its URL
async fn spawn_provider() -> Result<(Arc<Provider>, Url)> {
    let provider = Arc::new(Provider {
        fetches: AtomicUsize::new(0),
        down: AtomicBool::new(false),
    });
    let router = Router::new()
        .route("/.well-known/jwks.json", get(key_set))
        .with_state(provider.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let url = Url::parse(&format!("http://{}/.well-known/jwks.json", addr))?;
    Ok((provider, url))
}

fn app_with_key_set(url: Url, ttl: Duration) -> Result<TestApp> {
    let verifier = TokenVerifier::new(
        Arc::new(JwksClient::new(url, ttl)?),
        Algorithm::RS256,
        AUDIENCE,
        ISSUER,
    );
    Ok(TestApp::with_store_and_verifier(
        Arc::new(MemoryDrinkStore::new()),
        Arc::new(verifier),
    ))
}

fn rs256_token(kid: &str, claims: &Value) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY.as_bytes())?;
    Ok(encode(&header, claims, &key)?)
}

fn fetches(provider: &Provider) -> usize {
    provider.fetches.load(Ordering::SeqCst)
}

#[tokio::test]
async fn key_set_is_fetched_once_and_cached() -> Result<()> {
    let (provider, url) = spawn_provider().await?;
    let app = app_with_key_set(url, Duration::from_secs(600))?;
    let token = rs256_token(KID, &claims(ALL_PERMISSIONS))?;

    for _ in 0..3 {
        let (status, body) = app.get("/drinks-detail", Some(token.as_str())).await?;
        assert_eq!(status, StatusCode::OK, "body: {}", body);
    }
    assert_eq!(fetches(&provider), 1);

    // Unknown key id right after a download does not trigger another one
    let stranger = rs256_token("rotated-away", &claims(ALL_PERMISSIONS))?;
    let (status, body) = app.get("/drinks-detail", Some(stranger.as_str())).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_header");
    assert_eq!(body["message"], "Unable to find the appropriate key.");
    assert_eq!(fetches(&provider), 1);
    Ok(())
}

#[tokio::test]
async fn expired_key_set_is_refetched() -> Result<()> {
    let (provider, url) = spawn_provider().await?;
    let app = app_with_key_set(url, Duration::from_millis(200))?;
    let token = rs256_token(KID, &claims(ALL_PERMISSIONS))?;

    let (status, _) = app.get("/drinks-detail", Some(token.as_str())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetches(&provider), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;

    let (status, _) = app.get("/drinks-detail", Some(token.as_str())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetches(&provider), 2);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_keeps_serving_cached_keys() -> Result<()> {
    let (provider, url) = spawn_provider().await?;
    let app = app_with_key_set(url, Duration::from_millis(200))?;
    let token = rs256_token(KID, &claims(ALL_PERMISSIONS))?;

    let (status, _) = app.get("/drinks-detail", Some(token.as_str())).await?;
    assert_eq!(status, StatusCode::OK);

    provider.down.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let (status, body) = app.get("/drinks-detail", Some(token.as_str())).await?;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(fetches(&provider), 2);
    Ok(())
}

#[tokio::test]
async fn unreachable_provider_is_an_internal_error() -> Result<()> {
    // Reserve a port, then free it so nothing answers there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let url = Url::parse(&format!("http://{}/.well-known/jwks.json", addr))?;
    let app = app_with_key_set(url, Duration::from_secs(600))?;
    let token = rs256_token(KID, &claims(ALL_PERMISSIONS))?;

    let (status, body) = app.get("/drinks-detail", Some(token.as_str())).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "success": false, "error": 500, "message": "Internal server error" })
    );
    Ok(())
}
