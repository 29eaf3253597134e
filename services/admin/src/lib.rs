//! Catalog admin application
//!
//! [`App`] follows the session: it shows nothing while the session is
//! unresolved, the [`LoginScreen`] without an identity, and a products
//! screen bound to a fresh store for each signed-in identity.

pub mod app;
pub mod login;

pub use app::{App, Backends, View};
pub use login::LoginScreen;
