use std::{str::FromStr, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::Deserialize;

use super::{AuthError, KeySetCache};

/// Claims of a credential whose signature and standard claims were validated.
///
/// Produced by `TokenVerifier::verify`; a `ClaimSet` built anywhere else carries
/// no such guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject: Option<String>,
    pub expires_at: i64,
    pub audience: Vec<String>,
    pub issuer: String,
    pub permissions: Vec<String>,
}

impl ClaimSet {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

// Header fields read before the signature is checked.
#[derive(Debug, Deserialize)]
struct UnverifiedHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(aud) => vec![aud],
            Self::Many(auds) => auds,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
    #[serde(default)]
    aud: Option<Audience>,
    #[serde(default)]
    iss: Option<String>,
    // Absent and empty are different: absent is rejected, empty grants nothing.
    #[serde(default)]
    permissions: Option<Vec<String>>,
}

/// Verifies bearer credentials against the published key set.
///
/// Signature checking is delegated to `jsonwebtoken`; expiry, audience and
/// issuer are checked here so each failure keeps its own error kind and the
/// expiry boundary stays explicit (`exp == now` is expired).
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    issuer: String,
    audience: String,
    algorithm: Algorithm,
    leeway_seconds: i64,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("keys", &self.keys)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        keys: Arc<KeySetCache>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        algorithm: Algorithm,
        leeway_seconds: u64,
    ) -> Self {
        // Signature only; claims are validated in `validate_claims`.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm,
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
            validation,
        }
    }

    pub async fn verify(&self, credential: &str) -> Result<ClaimSet, AuthError> {
        self.verify_at(credential, chrono::Utc::now().timestamp())
            .await
    }

    /// Same as `verify` with an explicit current time (unix seconds).
    pub async fn verify_at(&self, credential: &str, now: i64) -> Result<ClaimSet, AuthError> {
        let header = decode_unverified_header(credential)?;
        let kid = header
            .kid
            .ok_or(AuthError::MalformedCredential("missing kid"))?;

        let algorithm = Algorithm::from_str(&header.alg)
            .map_err(|_| AuthError::UnsupportedAlgorithm(header.alg.clone()))?;
        if algorithm != self.algorithm {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let key = self.keys.find(&kid).await?;

        let data = jsonwebtoken::decode::<RawClaims>(credential, &key, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::Json(_) => AuthError::MalformedCredential("claims"),
                ErrorKind::Base64(_) | ErrorKind::Utf8(_) | ErrorKind::InvalidToken => {
                    AuthError::MalformedCredential("encoding")
                }
                // Key type does not fit the algorithm, or the crypto backend refused it.
                _ => AuthError::InvalidSignature,
            },
        )?;

        self.validate_claims(data.claims, now)
    }

    fn validate_claims(&self, claims: RawClaims, now: i64) -> Result<ClaimSet, AuthError> {
        if claims.exp.saturating_add(self.leeway_seconds) <= now {
            return Err(AuthError::TokenExpired);
        }

        let audience = claims.aud.map(Audience::into_vec).unwrap_or_default();
        if !audience.iter().any(|aud| aud == &self.audience) {
            return Err(AuthError::InvalidAudience);
        }

        let issuer = match claims.iss {
            Some(iss) if iss == self.issuer => iss,
            _ => return Err(AuthError::InvalidIssuer),
        };

        let permissions = claims
            .permissions
            .ok_or(AuthError::PermissionsClaimMissing)?;

        Ok(ClaimSet {
            subject: claims.sub,
            expires_at: claims.exp,
            audience,
            issuer,
            permissions,
        })
    }
}

fn decode_unverified_header(credential: &str) -> Result<UnverifiedHeader, AuthError> {
    let mut segments = credential.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedCredential("expected three segments"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedCredential("header encoding"))?;

    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedCredential("header"))
}
