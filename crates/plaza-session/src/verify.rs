//! Identity verification hook.
//!
//! Plaza doesn't issue or validate credentials itself — token issuance
//! lives in the surrounding HTTP service. This crate only defines the
//! [`TokenVerifier`] trait: one async method that turns an opaque token
//! into a stable [`UserId`] or fails. The server calls it once per
//! connection, during `join`.
//!
//! Verification failure is terminal for the connection and produces no
//! reply — the socket is simply closed, so a probing client learns nothing
//! about why.

use plaza_protocol::UserId;

use crate::SessionError;

/// Validates a client's credential and returns the identity behind it.
///
/// Implementations must be `Send + Sync + 'static`: the verifier is shared
/// across all connection tasks for the lifetime of the server.
///
/// # Example
///
/// ```rust
/// use plaza_session::{TokenVerifier, SessionError};
/// use plaza_protocol::UserId;
///
/// /// Accepts tokens of the form "user:<id>". Development only.
/// struct PrefixVerifier;
///
/// impl TokenVerifier for PrefixVerifier {
///     async fn verify(&self, token: &str) -> Result<UserId, SessionError> {
///         token
///             .strip_prefix("user:")
///             .map(UserId::new)
///             .ok_or_else(|| SessionError::AuthFailed("bad token".into()))
///     }
/// }
/// ```
pub trait TokenVerifier: Send + Sync + 'static {
    /// Verifies `token`, returning the stable identity it encodes.
    ///
    /// # Errors
    /// Returns [`SessionError::AuthFailed`] if the token is invalid,
    /// expired, or rejected by the backing identity provider.
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;
}
