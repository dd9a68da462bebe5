use std::{future::Future, sync::Arc};

use axum::http::HeaderValue;
use tracing::warn;

use super::{AuthError, ClaimSet, RequiredPermission, TokenVerifier, bearer, permission};

/// A required permission bound to the verifier that checks it.
///
/// `run` is the whole per-request pipeline: extract the bearer credential,
/// verify it, check the permission, and only then invoke the operation.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    verifier: Arc<TokenVerifier>,
    required: RequiredPermission,
}

impl PermissionGuard {
    pub fn new(verifier: Arc<TokenVerifier>, required: RequiredPermission) -> Self {
        Self { verifier, required }
    }

    pub fn required(&self) -> RequiredPermission {
        self.required
    }

    pub async fn authorize(&self, header: Option<&HeaderValue>) -> Result<ClaimSet, AuthError> {
        let credential = bearer::extract_bearer(header)?;
        let claims = self.verifier.verify(credential).await?;
        permission::enforce(claims, self.required)
    }

    /// Invoke `operation` with the verified claims, or reject without calling it.
    pub async fn run<F, Fut, T>(
        &self,
        header: Option<&HeaderValue>,
        operation: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(ClaimSet) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.authorize(header).await {
            Ok(claims) => Ok(operation(claims).await),
            Err(err) => {
                warn!(
                    error = %err,
                    code = err.code(),
                    permission = %self.required,
                    "request rejected"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use super::*;
    use crate::services::auth::testing::{StaticKeySource, TestSigner, claims_with, verifier};

    const CREATE: RequiredPermission = RequiredPermission::new("post:drinks");

    fn guard(signer: &TestSigner) -> PermissionGuard {
        let source = Arc::new(StaticKeySource::new(vec![signer.jwk()]));
        PermissionGuard::new(Arc::new(verifier(source)), CREATE)
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[tokio::test]
    async fn operation_receives_verified_claims() {
        let signer = TestSigner::new(5, "k");
        let header = bearer(&signer.sign(&claims_with(&["post:drinks"])));

        let subject = guard(&signer)
            .run(Some(&header), |claims| async move { claims.subject })
            .await
            .unwrap();

        assert_eq!(subject.as_deref(), Some("auth0|barista"));
    }

    #[tokio::test]
    async fn rejection_short_circuits_the_operation() {
        let signer = TestSigner::new(5, "k");
        let guard = guard(&signer);
        let invoked = AtomicBool::new(false);
        let denied = bearer(&signer.sign(&claims_with(&["get:drinks-detail"])));

        for (header, expected) in [
            (None, AuthError::MissingHeader),
            (
                Some(&denied),
                AuthError::PermissionDenied("post:drinks".into()),
            ),
        ] {
            let result = guard
                .run(header, |_| async { invoked.store(true, Ordering::SeqCst) })
                .await;
            assert_eq!(result, Err(expected));
        }

        assert!(!invoked.load(Ordering::SeqCst));
    }
}
