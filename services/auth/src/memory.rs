//! In-memory identity provider
//!
//! Keeps accounts and the current session in process memory. Used by tests
//! and local runs without a provider; failure switches let callers exercise
//! the error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Mutex, broadcast};
use tracing::info;
use uuid::Uuid;

use crate::identity::{AuthEvent, AuthSession, Identity};
use crate::provider::{IdentityProvider, ProviderError};
use crate::validation::Credentials;

const EVENT_CHANNEL_CAPACITY: usize = 16;

struct Account {
    password: String,
    identity: Identity,
}

/// In-memory implementation of [`IdentityProvider`]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
    sign_in_calls: AtomicUsize,
    fail_session_check: AtomicBool,
    fail_sign_out: AtomicBool,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            events,
            sign_in_calls: AtomicUsize::new(0),
            fail_session_check: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        }
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and return its identity
    pub async fn add_account(&self, email: &str, password: &str) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        self.accounts.lock().await.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    /// Issue a one-hour session for `identity`
    pub fn issue_session(identity: &Identity) -> AuthSession {
        AuthSession {
            access_token: format!("access-{}", Uuid::new_v4()),
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            expires_at: Utc::now() + Duration::hours(1),
            user: identity.clone(),
        }
    }

    /// Make `identity` the active session without announcing it
    pub async fn set_session(&self, identity: &Identity) -> AuthSession {
        let session = Self::issue_session(identity);
        *self.session.lock().await = Some(session.clone());
        session
    }

    /// Drop the active session without announcing it
    pub async fn clear_session(&self) {
        self.session.lock().await.take();
    }

    /// Push a notification to every subscriber
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn fail_session_check(&self, fail: bool) {
        self.fail_session_check.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        if self.fail_session_check.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(
                "session check failed".to_string(),
            ));
        }

        let session = self.session.lock().await.clone();
        Ok(session.filter(|session| !session.is_expired(Utc::now())))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let identity = {
            let accounts = self.accounts.lock().await;
            match accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => {
                    account.identity.clone()
                }
                _ => {
                    return Err(ProviderError::Rejected(
                        "Invalid login credentials".to_string(),
                    ));
                }
            }
        };

        info!("Signed in user: {}", identity.id);
        let session = Self::issue_session(&identity);
        *self.session.lock().await = Some(session.clone());
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.session.lock().await.take();
        self.emit(AuthEvent::signed_out());

        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("network unreachable".to_string()));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
