/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    // Without a database the drinks live in memory for the lifetime of the process.
    pub database_url: Option<String>,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_algorithm: Algorithm,
    pub auth_jwks_url: Url,
    pub auth_leeway_seconds: u64,

    pub key_set_max_age_seconds: u64,
    pub key_set_fetch_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let auth_audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let auth_algorithm =
            parse_algorithm(&std::env::var("AUTH_ALGORITHM").unwrap_or_else(|_| "RS256".into()))?;

        let auth_jwks_url = resolve_jwks_url(
            std::env::var("AUTH_JWKS_URL").ok(),
            std::env::var("AUTH_DOMAIN").ok(),
        )?;

        let auth_leeway_seconds = env_u64("AUTH_LEEWAY_SECONDS", 0);
        let key_set_max_age_seconds = env_u64("KEY_SET_MAX_AGE_SECONDS", 600);
        let key_set_fetch_timeout_seconds = env_u64("KEY_SET_FETCH_TIMEOUT_SECONDS", 5).max(1);

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth_issuer,
            auth_audience,
            auth_algorithm,
            auth_jwks_url,
            auth_leeway_seconds,
            key_set_max_age_seconds,
            key_set_fetch_timeout_seconds,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Expected signing algorithm. Shared-secret (HS*) algorithms are refused.
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let algorithm =
        Algorithm::from_str(raw.trim()).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHM"))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(ConfigError::Invalid("AUTH_ALGORITHM"))
        }
        _ => Ok(algorithm),
    }
}

/// `AUTH_JWKS_URL` wins; otherwise the Auth0-style well-known path under `AUTH_DOMAIN`.
fn resolve_jwks_url(explicit: Option<String>, domain: Option<String>) -> Result<Url, ConfigError> {
    if let Some(url) = explicit.filter(|s| !s.trim().is_empty()) {
        return Url::parse(url.trim()).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"));
    }

    let domain = domain
        .map(|d| d.trim().trim_end_matches('/').to_string())
        .filter(|d| !d.is_empty())
        .ok_or(ConfigError::Missing("AUTH_JWKS_URL"))?;

    Url::parse(&format!("https://{}/.well-known/jwks.json", domain))
        .map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asymmetric_algorithms_are_accepted() {
        assert_eq!(parse_algorithm("RS256"), Ok(Algorithm::RS256));
        assert_eq!(parse_algorithm(" EdDSA "), Ok(Algorithm::EdDSA));
        assert_eq!(parse_algorithm("ES256"), Ok(Algorithm::ES256));
    }

    #[test]
    fn shared_secret_and_unknown_algorithms_are_refused() {
        for raw in ["HS256", "HS512", "none", ""] {
            assert_eq!(
                parse_algorithm(raw),
                Err(ConfigError::Invalid("AUTH_ALGORITHM")),
                "{raw}"
            );
        }
    }

    #[test]
    fn explicit_jwks_url_wins_over_domain() {
        let url = resolve_jwks_url(
            Some("https://keys.example.com/jwks".into()),
            Some("tenant.auth0.com".into()),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://keys.example.com/jwks");
    }

    #[test]
    fn jwks_url_is_derived_from_domain() {
        let url = resolve_jwks_url(None, Some("tenant.auth0.com/".into())).unwrap();
        assert_eq!(url.as_str(), "https://tenant.auth0.com/.well-known/jwks.json");
    }

    #[test]
    fn jwks_url_is_required() {
        assert_eq!(
            resolve_jwks_url(None, None),
            Err(ConfigError::Missing("AUTH_JWKS_URL"))
        );
        assert_eq!(
            resolve_jwks_url(Some("not a url".into()), None),
            Err(ConfigError::Invalid("AUTH_JWKS_URL"))
        );
    }
}
