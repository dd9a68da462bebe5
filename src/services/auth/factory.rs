/// Factory: build `TokenVerifier` (and its key-set cache) from application `Config`.
use std::{sync::Arc, time::Duration};

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{JwksHttpSource, KeySetCache, TokenVerifier};

pub fn build_token_verifier(config: &Config) -> Result<Arc<TokenVerifier>, AppError> {
    let fetch_timeout = Duration::from_secs(config.key_set_fetch_timeout_seconds);

    let source = JwksHttpSource::new(config.auth_jwks_url.clone(), fetch_timeout).map_err(|e| {
        tracing::error!(error = %e, "failed to build key set client");
        AppError::Internal
    })?;

    let keys = KeySetCache::new(
        Arc::new(source),
        Duration::from_secs(config.key_set_max_age_seconds),
        fetch_timeout,
    );

    Ok(Arc::new(TokenVerifier::new(
        Arc::new(keys),
        config.auth_issuer.clone(),
        config.auth_audience.clone(),
        config.auth_algorithm,
        config.auth_leeway_seconds,
    )))
}
