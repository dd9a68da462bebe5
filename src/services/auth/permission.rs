use std::fmt;

use super::{AuthError, ClaimSet};

/// Permission a protected route demands, fixed when the router is built.
///
/// Only constructible from a `'static` string so it can never come from
/// request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequiredPermission(&'static str);

impl RequiredPermission {
    pub const fn new(permission: &'static str) -> Self {
        Self(permission)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Pass `claims` through unchanged if they grant `required`.
pub fn enforce(claims: ClaimSet, required: RequiredPermission) -> Result<ClaimSet, AuthError> {
    if claims.has_permission(required.as_str()) {
        Ok(claims)
    } else {
        Err(AuthError::PermissionDenied(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(permissions: &[&str]) -> ClaimSet {
        ClaimSet {
            subject: Some("auth0|barista".into()),
            expires_at: 4_102_444_800,
            audience: vec!["drinks".into()],
            issuer: "https://drinks.example.auth0.com/".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn missing_permission_is_denied() {
        let err = enforce(
            claims(&["get:drinks-detail"]),
            RequiredPermission::new("post:drinks"),
        )
        .unwrap_err();

        assert_eq!(err, AuthError::PermissionDenied("post:drinks".into()));
    }

    #[test]
    fn granted_permission_passes_claims_through_unchanged() {
        let original = claims(&["get:drinks-detail"]);

        let passed = enforce(
            original.clone(),
            RequiredPermission::new("get:drinks-detail"),
        )
        .unwrap();

        assert_eq!(passed, original);
    }

    #[test]
    fn membership_is_exact() {
        let err = enforce(claims(&["post:drinks "]), RequiredPermission::new("post:drinks"));
        assert!(err.is_err());
        assert!(enforce(claims(&[]), RequiredPermission::new("post:drinks")).is_err());
    }
}
