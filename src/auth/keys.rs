use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Minimum time between two key set downloads triggered by an unknown `kid`
const REFETCH_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("Failed to fetch signing keys: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Unusable signing key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Source of token verification keys, looked up by key id
#[async_trait]
pub trait SigningKeys: Send + Sync {
    async fn key(&self, kid: &str) -> Result<Option<DecodingKey>, KeySetError>;
}

/// Fixed set of keys known at startup
#[derive(Clone, Default)]
pub struct StaticKeys {
    keys: HashMap<String, DecodingKey>,
}

impl StaticKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.keys.insert(kid.into(), key);
        self
    }

    /// Single HMAC shared secret under `kid`
    pub fn shared_secret(kid: impl Into<String>, secret: &[u8]) -> Self {
        Self::new().with_key(kid, DecodingKey::from_secret(secret))
    }
}

#[async_trait]
impl SigningKeys for StaticKeys {
    async fn key(&self, kid: &str) -> Result<Option<DecodingKey>, KeySetError> {
        Ok(self.keys.get(kid).cloned())
    }
}

struct CachedKeySet {
    keys: JwkSet,
    fetched_at: Instant,
}

#[derive(Default)]
struct KeyCache {
    current: Option<CachedKeySet>,
    /// Last download attempt, successful or not
    last_attempt: Option<Instant>,
}

impl KeyCache {
    /// The cached set, when it can answer for `kid` without a download.
    ///
    /// A fresh set containing `kid` always can. Any set can while a download
    /// was attempted less than `cooldown` ago, so unknown key ids and a failing
    /// provider cost at most one download per cooldown.
    fn usable(&self, kid: &str, ttl: Duration, cooldown: Duration) -> Option<&JwkSet> {
        let cached = self.current.as_ref()?;
        let fresh = cached.fetched_at.elapsed() < ttl && cached.keys.find(kid).is_some();
        let recently_tried = self.last_attempt.is_some_and(|at| at.elapsed() < cooldown);
        (fresh || recently_tried).then_some(&cached.keys)
    }
}

/// Identity provider JSON Web Key Set, downloaded on demand and cached.
///
/// The set is refetched once the cache is older than `ttl`, or when a token
/// names a key id the cached set does not contain (provider key rotation).
/// If a refresh fails the previous set keeps being served.
pub struct JwksClient {
    http: reqwest::Client,
    url: Url,
    ttl: Duration,
    cache: RwLock<KeyCache>,
}

impl JwksClient {
    pub fn new(url: Url, ttl: Duration) -> Result<Self, KeySetError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            url,
            ttl,
            cache: RwLock::new(KeyCache::default()),
        })
    }

    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let keys = self
            .http
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;

        info!("Fetched {} signing keys from {}", keys.keys.len(), self.url);
        Ok(keys)
    }

    fn lookup(keys: &JwkSet, kid: &str) -> Result<Option<DecodingKey>, KeySetError> {
        keys.find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(KeySetError::from)
    }
}

#[async_trait]
impl SigningKeys for JwksClient {
    async fn key(&self, kid: &str) -> Result<Option<DecodingKey>, KeySetError> {
        let cooldown = REFETCH_COOLDOWN.min(self.ttl);

        // Fast path: try read lock
        {
            let cache = self.cache.read().await;
            if let Some(keys) = cache.usable(kid, self.ttl, cooldown) {
                return Self::lookup(keys, kid);
            }
        }

        // One download at a time; waiters reuse its result
        let mut cache = self.cache.write().await;
        if let Some(keys) = cache.usable(kid, self.ttl, cooldown) {
            return Self::lookup(keys, kid);
        }

        debug!("Refreshing signing keys for kid {}", kid);
        cache.last_attempt = Some(Instant::now());
        match self.fetch().await {
            Ok(keys) => {
                let found = Self::lookup(&keys, kid);
                cache.current = Some(CachedKeySet {
                    keys,
                    fetched_at: Instant::now(),
                });
                found
            }
            Err(e) => match cache.current.as_ref() {
                Some(stale) => {
                    warn!("Key set refresh failed, serving cached keys: {}", e);
                    Self::lookup(&stale.keys, kid)
                }
                None => Err(e),
            },
        }
    }
}
