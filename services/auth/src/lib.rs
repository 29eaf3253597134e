//! Authentication for the catalog admin
//!
//! The identity provider is an external collaborator reached through the
//! [`IdentityProvider`] port. [`SessionManager`] turns its answers and push
//! notifications into a single [`SessionState`] that the rest of the
//! application observes.

pub mod claims;
pub mod gotrue;
pub mod identity;
pub mod memory;
pub mod provider;
pub mod session;
pub mod state;
pub mod validation;

pub use identity::{AuthEvent, AuthEventKind, AuthSession, Identity};
pub use provider::{IdentityProvider, ProviderError};
pub use session::SessionManager;
pub use state::{SessionEvent, SessionState, transition};
pub use validation::Credentials;
