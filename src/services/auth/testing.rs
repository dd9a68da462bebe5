//! Test fixtures: an Ed25519 token signer and in-process key-set sources.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signer, SigningKey};
use jsonwebtoken::{
    Algorithm,
    jwk::{Jwk, JwkSet},
};
use serde_json::{Value, json};

use super::{KeySetCache, KeySetError, KeySetSource, TokenVerifier};

pub const ISSUER: &str = "https://drinks.example.auth0.com/";
pub const AUDIENCE: &str = "drinks";

/// Signs compact JWS tokens the way an identity provider would.
pub struct TestSigner {
    signing_key: SigningKey,
    kid: String,
}

impl TestSigner {
    pub fn new(seed: u8, kid: &str) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&[seed; 32]),
            kid: kid.to_string(),
        }
    }

    /// Public half as published in the JWKS document.
    pub fn jwk(&self) -> Jwk {
        let x = URL_SAFE_NO_PAD.encode(self.signing_key.verifying_key().to_bytes());
        serde_json::from_value(json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": x,
            "kid": self.kid,
            "alg": "EdDSA",
            "use": "sig",
        }))
        .expect("valid jwk")
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_header(&json!({"alg": "EdDSA", "typ": "JWT", "kid": self.kid}), claims)
    }

    pub fn sign_with_header(&self, header: &Value, claims: &Value) -> String {
        let signing_input = format!("{}.{}", b64url_json(header), b64url_json(claims));
        let signature = self.signing_key.sign(signing_input.as_bytes());
        format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }
}

fn b64url_json(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).expect("serialize json"))
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims valid for an hour carrying `permissions`.
pub fn claims_with(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "sub": "auth0|barista",
        "aud": [AUDIENCE, "https://drinks.example.auth0.com/userinfo"],
        "iat": now(),
        "exp": now() + 3600,
        "permissions": permissions,
    })
}

/// Serves whatever key set it currently holds and counts fetches.
pub struct StaticKeySource {
    keys: Mutex<Vec<Jwk>>,
    fetches: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    failing: AtomicBool,
}

impl StaticKeySource {
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self {
            keys: Mutex::new(keys),
            fetches: AtomicUsize::new(0),
            delay: Mutex::new(None),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Answer every following fetch with 503.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn replace(&self, keys: Vec<Jwk>) {
        *self.keys.lock().unwrap() = keys;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for StaticKeySource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(KeySetError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        let keys = self.keys.lock().unwrap().clone();
        Ok(JwkSet { keys })
    }
}

/// EdDSA verifier for `ISSUER` / `AUDIENCE` backed by `source`.
pub fn verifier(source: Arc<StaticKeySource>) -> TokenVerifier {
    let keys = KeySetCache::new(source, Duration::from_secs(600), Duration::from_secs(2));
    TokenVerifier::new(Arc::new(keys), ISSUER, AUDIENCE, Algorithm::EdDSA, 0)
}
