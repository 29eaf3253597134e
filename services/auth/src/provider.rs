//! Identity provider port

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::identity::{AuthEvent, AuthSession};
use crate::validation::Credentials;

/// Errors reported by an identity provider adapter
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider refused the request (bad credentials, revoked token)
    #[error("{0}")]
    Rejected(String),

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other non-success answer
    #[error("Identity provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider handed back a token this client cannot read
    #[error("Invalid access token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The adapter is unavailable
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Remote identity provider
///
/// Implementations own credential verification, session issuance and token
/// refresh. Every state change they make locally is also announced on the
/// channel returned by [`IdentityProvider::subscribe`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> Result<Option<AuthSession>, ProviderError>;

    /// Verify credentials and open a session
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ProviderError>;

    /// Close the current session; the local session is dropped even when
    /// the remote call fails
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Subscribe to push notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
