//! GoTrue (Supabase Auth) client
//!
//! Talks to the provider's REST API and keeps the current session in
//! memory for the lifetime of the process.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::config::AuthSettings;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::claims;
use crate::identity::{AuthEvent, AuthSession, Identity};
use crate::provider::{IdentityProvider, ProviderError};
use crate::validation::Credentials;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Error payloads differ between GoTrue versions
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// GoTrue REST client
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    bootstrap_refresh_token: Mutex<Option<String>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueClient {
    /// Create a client for the project at `url` (for example
    /// `https://<project>.supabase.co`)
    pub fn new(url: &str, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client: Client::new(),
            base_url: format!("{}/auth/v1", url.trim_end_matches('/')),
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            bootstrap_refresh_token: Mutex::new(None),
            events,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        let client = Self::new(&settings.url, settings.anon_key.clone());
        match &settings.refresh_token {
            Some(token) if !token.is_empty() => client.with_refresh_token(token.clone()),
            _ => client,
        }
    }

    /// Refresh token used to restore a session on the first `get_session`
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.bootstrap_refresh_token = Mutex::new(Some(refresh_token.into()));
        self
    }

    /// Seed the client with a previously issued session
    pub async fn restore(&self, session: AuthSession) {
        info!("Restoring session for user: {}", session.user.id);
        *self.session.write().await = Some(session);
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn emit(&self, event: AuthEvent) {
        if self.events.send(event).is_err() {
            debug!("No session listeners registered");
        }
    }

    async fn token_request<T: Serialize>(
        &self,
        grant_type: &str,
        body: &T,
    ) -> Result<AuthSession, ProviderError> {
        let response = self
            .client
            .post(self.endpoint("/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(error_for_status(status, body));
        }

        let token: TokenResponse = response.json().await?;
        session_from_response(token, Utc::now())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn get_session(&self) -> Result<Option<AuthSession>, ProviderError> {
        let current = self.session.read().await.clone();
        let (refresh_token, restoring) = match current {
            Some(session) if !session.is_expired(Utc::now()) => return Ok(Some(session)),
            Some(session) => (session.refresh_token, false),
            None => match self.bootstrap_refresh_token.lock().await.take() {
                Some(token) => (token, true),
                None => return Ok(None),
            },
        };

        debug!("Refreshing session (restoring: {})", restoring);
        match self
            .token_request("refresh_token", &RefreshGrant {
                refresh_token: &refresh_token,
            })
            .await
        {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                if restoring {
                    self.emit(AuthEvent::signed_in(session.clone()));
                } else {
                    self.emit(AuthEvent::token_refreshed(session.clone()));
                }
                Ok(Some(session))
            }
            Err(e) => {
                warn!("Failed to refresh session: {}", e);
                *self.session.write().await = None;
                Err(e)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ProviderError> {
        info!("Login attempt for user: {}", credentials.email);

        let session = self
            .token_request("password", &PasswordGrant {
                email: &credentials.email,
                password: &credentials.password,
            })
            .await?;

        *self.session.write().await = Some(session.clone());
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let session = self.session.write().await.take();
        self.bootstrap_refresh_token.lock().await.take();

        let result = match session {
            Some(session) => {
                info!("Logout request for user: {}", session.user.id);
                self.logout(&session.access_token).await
            }
            None => Ok(()),
        };

        self.emit(AuthEvent::signed_out());
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

impl GoTrueClient {
    async fn logout(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.endpoint("/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(error_for_status(status, body))
    }
}

fn error_for_status(status: StatusCode, body: ErrorBody) -> ProviderError {
    let message = body
        .into_message()
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Rejected(message)
        }
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn session_from_response(
    token: TokenResponse,
    now: DateTime<Utc>,
) -> Result<AuthSession, ProviderError> {
    let expires_at = match (token.expires_at, token.expires_in) {
        (Some(at), _) => DateTime::from_timestamp(at, 0),
        (None, Some(seconds)) => Some(now + Duration::seconds(seconds)),
        (None, None) => claims::decode_unverified(&token.access_token)?.expires_at(),
    }
    .ok_or(jsonwebtoken::errors::ErrorKind::InvalidToken)
    .map_err(jsonwebtoken::errors::Error::from)?;

    Ok(AuthSession {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        user: Identity {
            id: token.user.id,
            email: token.user.email,
        },
    })
}
