pub mod bearer;
pub mod error;
pub mod factory;
pub mod guard;
pub mod key_set;
pub mod permission;
pub mod verifier;

#[cfg(test)]
pub mod testing;

pub use error::AuthError;
pub use factory::build_token_verifier;
pub use guard::PermissionGuard;
pub use key_set::{JwksHttpSource, KeySetCache, KeySetError, KeySetSource};
pub use permission::RequiredPermission;
pub use verifier::{ClaimSet, TokenVerifier};
