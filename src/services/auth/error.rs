use thiserror::Error;

/// Reasons a request is rejected by the authorization pipeline.
///
/// Every variant is terminal for the request. The only retry anywhere in the
/// pipeline is the single key-set refresh performed before `UnknownSigningKey`
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is expected")]
    MissingHeader,
    #[error("authorization header must be of the form `Bearer <token>`")]
    MalformedHeader,
    #[error("authorization header must use the Bearer scheme")]
    UnsupportedScheme,
    #[error("credential could not be decoded: {0}")]
    MalformedCredential(&'static str),
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("no signing key found for kid `{0}`")]
    UnknownSigningKey(String),
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("incorrect audience")]
    InvalidAudience,
    #[error("incorrect issuer")]
    InvalidIssuer,
    #[error("permissions not included in token")]
    PermissionsClaimMissing,
    #[error("permission `{0}` not granted")]
    PermissionDenied(String),
}

impl AuthError {
    /// Machine-readable code surfaced in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::MalformedHeader => "malformed_header",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::MalformedCredential(_) => "malformed_credential",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::UnknownSigningKey(_) => "unknown_signing_key",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidAudience => "invalid_audience",
            Self::InvalidIssuer => "invalid_issuer",
            Self::PermissionsClaimMissing => "permissions_claim_missing",
            Self::PermissionDenied(_) => "permission_denied",
        }
    }

    /// `true` when the caller is authenticated but lacks the permission.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
