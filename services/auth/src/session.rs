//! Session management
//!
//! [`SessionManager`] owns the session state. The startup check, provider
//! push notifications and explicit sign-in/sign-out all feed the same
//! transition function; the result is published on a watch channel.
//! Broadcast notifications can arrive after a later explicit call, so the
//! listener only applies one the provider's current session still agrees
//! with.

use std::sync::Arc;

use common::error::{Action, AppError, AppResult};
use common::validation::FormInput;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::identity::{AuthEvent, Identity};
use crate::provider::IdentityProvider;
use crate::state::{SessionEvent, SessionState, transition};
use crate::validation::Credentials;

/// Owner of the session state and of the provider subscription
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    listener: JoinHandle<()>,
}

impl SessionManager {
    /// Create a manager in the `Unknown` state and start listening to the
    /// provider's notifications
    ///
    /// Must be called from within a Tokio runtime. The subscription lives as
    /// long as the manager.
    pub fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let (sender, _) = watch::channel(SessionState::Unknown);
        let state = Arc::new(sender);

        let mut events = provider.subscribe();
        let listener_state = Arc::clone(&state);
        let listener_provider = Arc::clone(&provider);
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let event = SessionEvent::from(&event);
                        if still_current(listener_provider.as_ref(), &event).await {
                            apply(&listener_state, &event);
                        } else {
                            debug!("Dropping stale session notification {:?}", event);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session listener skipped {} provider events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Identity provider closed its event channel");
                        break;
                    }
                }
            }
        });

        Self {
            provider,
            state,
            listener,
        }
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Query the provider once at startup
    ///
    /// Always resolves the `Unknown` state: a failed check leaves the
    /// session `Unauthenticated` and reports the error.
    pub async fn check_initial_session(&self) -> AppResult<SessionState> {
        info!("Checking for an existing session");

        match self.provider.get_session().await {
            Ok(session) => {
                let identity = session.map(|session| session.user);
                Ok(apply(&self.state, &SessionEvent::Initial(identity)))
            }
            Err(e) => {
                error!("Session check failed: {}", e);
                apply(&self.state, &SessionEvent::Initial(None));
                Err(AppError::auth(Action::CheckSession, e))
            }
        }
    }

    /// Apply a provider notification directly
    pub fn on_session_event(&self, event: &AuthEvent) -> SessionState {
        apply(&self.state, &SessionEvent::from(event))
    }

    /// Validate the login form, then sign in with the provider
    ///
    /// Invalid input is rejected before the provider is contacted. On
    /// success the session is `Authenticated` when this returns.
    pub async fn sign_in(&self, form: &FormInput) -> AppResult<Identity> {
        let credentials = Credentials::from_form(form)?;

        let session = self
            .provider
            .sign_in_with_password(&credentials)
            .await
            .map_err(|e| {
                warn!("Sign-in failed for {}: {}", credentials.email, e);
                AppError::auth(Action::SignIn, e)
            })?;

        let identity = session.user;
        apply(&self.state, &SessionEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Sign out with the provider
    ///
    /// The session is `Unauthenticated` afterwards whatever the remote
    /// outcome; a remote failure is returned but not retried.
    pub async fn sign_out(&self) -> AppResult<()> {
        let result = self.provider.sign_out().await;
        apply(&self.state, &SessionEvent::SignedOut);

        result.map_err(|e| {
            warn!("Remote sign-out failed, local session cleared anyway: {}", e);
            AppError::auth(Action::SignOut, e)
        })
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Whether a pushed event matches the provider's session right now
///
/// An unanswered check lets the event through.
async fn still_current(provider: &dyn IdentityProvider, event: &SessionEvent) -> bool {
    let session = match provider.get_session().await {
        Ok(session) => session,
        Err(e) => {
            debug!("Could not confirm session notification: {}", e);
            return true;
        }
    };

    match event {
        SessionEvent::SignedIn(identity) => {
            session.is_some_and(|session| session.user.id == identity.id)
        }
        SessionEvent::SignedOut => session.is_none(),
        SessionEvent::Initial(_) | SessionEvent::Ignored => true,
    }
}

fn apply(state: &watch::Sender<SessionState>, event: &SessionEvent) -> SessionState {
    state.send_if_modified(|current| {
        let next = transition(current, event);
        if next == *current {
            return false;
        }
        info!("Session state: {:?} -> {:?}", current, next);
        *current = next;
        true
    });
    state.borrow().clone()
}
