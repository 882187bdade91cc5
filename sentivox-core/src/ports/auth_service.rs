//! Remote authentication service port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Identity, SessionCheck};

/// The remote authentication service
///
/// Every method is a suspension point. Implementations report timeouts,
/// connection failures and undecodable responses as `Error::Network`; the
/// callers treat "no response" and "error response" the same way.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Ask the service who the current session belongs to
    async fn session_check(&self) -> Result<SessionCheck>;

    /// Exchange credentials for an identity
    ///
    /// `None` delegates to the server's default-credential handling.
    async fn login(&self, email: &str, password: Option<&str>) -> Result<Identity>;

    /// End the server-side session
    async fn logout(&self) -> Result<()>;

    /// Ask for a recovery link to be sent
    ///
    /// Succeeds whether or not an account exists for `email`.
    async fn request_recovery(&self, email: &str) -> Result<()>;

    /// Whether a recovery token is currently valid for `email`
    async fn verify_recovery_token(&self, token: &str, email: &str) -> Result<bool>;

    /// Set a new password using a recovery token
    ///
    /// A refusal carries the server's reason as `Error::Rejected`.
    async fn submit_recovery(&self, email: &str, token: &str, new_password: &str) -> Result<()>;
}
