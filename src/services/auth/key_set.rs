//! Published signing keys (JWKS) and the process-wide cache in front of them.
//!
//! The cache is explicit shared state owned by `AppState`. Lookups take the read
//! lock only; a miss triggers at most one refresh per request, and concurrent
//! misses coalesce on `refresh_lock` + the attempt counter so that waiters
//! reuse the outcome of whichever task got there first, failed or not.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, jwk::JwkSet};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::AuthError;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("key set endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Where the current key set comes from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// Fetches the JWKS document published by the identity provider.
#[derive(Debug, Clone)]
pub struct JwksHttpSource {
    client: reqwest::Client,
    url: Url,
}

impl JwksHttpSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySetSource for JwksHttpSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let response = self.client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(KeySetError::Status(response.status()));
        }

        Ok(response.json::<JwkSet>().await?)
    }
}

#[derive(Default)]
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
    // Bumped on every refresh attempt, including failed and timed-out ones.
    attempts: u64,
}

impl CachedKeys {
    fn is_fresh(&self, max_age: Duration) -> bool {
        self.fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < max_age)
    }
}

pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    cached: RwLock<CachedKeys>,
    refresh_lock: Mutex<()>,
    max_age: Duration,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("KeySetCache")
            .field("max_age", &self.max_age)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl KeySetCache {
    /// Starts empty; the first lookup performs the initial fetch.
    pub fn new(source: Arc<dyn KeySetSource>, max_age: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            cached: RwLock::new(CachedKeys::default()),
            refresh_lock: Mutex::new(()),
            max_age,
            fetch_timeout,
        }
    }

    /// Resolve the verification key for `kid`.
    ///
    /// A miss (or a stale set) refreshes exactly once before giving up. A failed
    /// or timed-out refresh fails closed as `UnknownSigningKey`, unless the key
    /// is still present in the previously fetched set.
    pub async fn find(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let observed = {
            let cached = self.cached.read().await;
            if cached.is_fresh(self.max_age)
                && let Some(key) = cached.keys.get(kid)
            {
                return Ok(key.clone());
            }
            cached.attempts
        };

        self.refresh_after(observed).await;

        self.cached
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_string()))
    }

    // Refresh unless another task already tried since `observed` was read.
    async fn refresh_after(&self, observed: u64) {
        let _guard = self.refresh_lock.lock().await;

        if self.cached.read().await.attempts != observed {
            debug!("key set refresh already attempted by a concurrent request");
            return;
        }

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(set)) => Some(set),
            Ok(Err(err)) => {
                warn!(error = %err, "key set refresh failed");
                None
            }
            Err(_) => {
                warn!(timeout = ?self.fetch_timeout, "key set refresh timed out");
                None
            }
        };

        let mut cached = self.cached.write().await;
        cached.attempts += 1;

        let Some(fetched) = fetched else {
            return;
        };
        cached.keys = decode_keys(&fetched);
        cached.fetched_at = Some(Instant::now());

        info!(
            keys = cached.keys.len(),
            attempt = cached.attempts,
            "key set refreshed"
        );
    }
}

fn decode_keys(set: &JwkSet) -> HashMap<String, DecodingKey> {
    set.keys
        .iter()
        .filter_map(|jwk| {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("skipping published key without kid");
                return None;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => Some((kid, key)),
                Err(err) => {
                    warn!(kid = %kid, error = %err, "skipping unusable published key");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::services::auth::testing::{StaticKeySource, TestSigner};

    fn cache(source: Arc<StaticKeySource>) -> KeySetCache {
        KeySetCache::new(source, Duration::from_secs(600), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn first_lookup_fetches_then_serves_from_cache() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(StaticKeySource::new(vec![signer.jwk()]));
        let keys = cache(source.clone());

        assert!(keys.find("k1").await.is_ok());
        assert!(keys.find("k1").await.is_ok());
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn unknown_kid_refreshes_exactly_once() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(StaticKeySource::new(vec![signer.jwk()]));
        let keys = cache(source.clone());
        keys.find("k1").await.unwrap();

        let err = keys.find("rotated-away").await.err();

        assert_eq!(err, Some(AuthError::UnknownSigningKey("rotated-away".into())));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn rotated_key_is_picked_up_on_miss() {
        let old = TestSigner::new(1, "old");
        let new = TestSigner::new(2, "new");
        let source = Arc::new(StaticKeySource::new(vec![old.jwk()]));
        let keys = cache(source.clone());
        keys.find("old").await.unwrap();

        source.replace(vec![new.jwk()]);

        assert!(keys.find("new").await.is_ok());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(
            StaticKeySource::new(vec![signer.jwk()]).with_delay(Duration::from_millis(50)),
        );
        let keys = Arc::new(cache(source.clone()));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let keys = keys.clone();
            tasks.spawn(async move { keys.find("k1").await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn fetch_timeout_fails_closed() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(
            StaticKeySource::new(vec![signer.jwk()]).with_delay(Duration::from_secs(5)),
        );
        let keys = KeySetCache::new(source, Duration::from_secs(600), Duration::from_millis(20));

        let err = keys.find("k1").await.err();

        assert_eq!(err, Some(AuthError::UnknownSigningKey("k1".into())));
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_timed_out_fetch() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(
            StaticKeySource::new(vec![signer.jwk()]).with_delay(Duration::from_secs(5)),
        );
        let keys = Arc::new(KeySetCache::new(
            source.clone(),
            Duration::from_secs(600),
            Duration::from_millis(100),
        ));
        let started = std::time::Instant::now();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let keys = keys.clone();
            tasks.spawn(async move { keys.find("k1").await.err() });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(
                result.unwrap(),
                Some(AuthError::UnknownSigningKey("k1".into()))
            );
        }

        assert_eq!(source.fetch_count(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn previous_set_is_served_when_refresh_fails() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(StaticKeySource::new(vec![signer.jwk()]));
        let keys = KeySetCache::new(source.clone(), Duration::ZERO, Duration::from_secs(2));
        keys.find("k1").await.unwrap();

        source.set_failing(true);

        assert!(keys.find("k1").await.is_ok());
        assert_eq!(
            keys.find("k2").await.err(),
            Some(AuthError::UnknownSigningKey("k2".into()))
        );
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn previous_set_is_served_when_refresh_times_out() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(StaticKeySource::new(vec![signer.jwk()]));
        let keys = KeySetCache::new(source.clone(), Duration::ZERO, Duration::from_millis(50));
        keys.find("k1").await.unwrap();

        source.set_delay(Duration::from_secs(5));

        assert!(keys.find("k1").await.is_ok());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn stale_set_is_refreshed_before_use() {
        let signer = TestSigner::new(1, "k1");
        let source = Arc::new(StaticKeySource::new(vec![signer.jwk()]));
        let keys = KeySetCache::new(source.clone(), Duration::ZERO, Duration::from_secs(2));

        keys.find("k1").await.unwrap();
        keys.find("k1").await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn keys_without_kid_are_skipped() {
        let signer = TestSigner::new(1, "k1");
        let mut anonymous = TestSigner::new(2, "unused").jwk();
        anonymous.common.key_id = None;
        let source = Arc::new(StaticKeySource::new(vec![anonymous, signer.jwk()]));
        let keys = cache(source);

        assert!(keys.find("k1").await.is_ok());
        assert!(keys.find("unused").await.is_err());
    }
}
