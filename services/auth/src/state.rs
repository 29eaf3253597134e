//! Session state machine
//!
//! All session transitions go through [`transition`], a pure mapping from
//! the current state and an event to the next state.

use crate::identity::{AuthEvent, AuthEventKind, Identity};

/// The client's belief about the current authentication status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The startup check has not resolved yet
    #[default]
    Unknown,
    Authenticated(Identity),
    Unauthenticated,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }
}

/// Input of the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Outcome of the startup check
    Initial(Option<Identity>),
    SignedIn(Identity),
    SignedOut,
    /// Events with no bearing on the session status
    Ignored,
}

impl From<&AuthEvent> for SessionEvent {
    fn from(event: &AuthEvent) -> Self {
        match event.kind {
            AuthEventKind::SignedIn => event
                .session
                .as_ref()
                .map(|session| SessionEvent::SignedIn(session.user.clone()))
                .unwrap_or(SessionEvent::Ignored),
            AuthEventKind::SignedOut => SessionEvent::SignedOut,
            AuthEventKind::TokenRefreshed
            | AuthEventKind::UserUpdated
            | AuthEventKind::PasswordRecovery => SessionEvent::Ignored,
        }
    }
}

/// Next session state after `event`
///
/// The startup check only resolves an `Unknown` state: once a live event
/// has resolved the session, the older startup answer is discarded.
pub fn transition(state: &SessionState, event: &SessionEvent) -> SessionState {
    match (state, event) {
        (SessionState::Unknown, SessionEvent::Initial(Some(identity))) => {
            SessionState::Authenticated(identity.clone())
        }
        (SessionState::Unknown, SessionEvent::Initial(None)) => SessionState::Unauthenticated,
        (_, SessionEvent::Initial(_)) => state.clone(),
        (_, SessionEvent::SignedIn(identity)) => SessionState::Authenticated(identity.clone()),
        (_, SessionEvent::SignedOut) => SessionState::Unauthenticated,
        (_, SessionEvent::Ignored) => state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthSession;
    use chrono::Utc;
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: Some("ana@example.com".to_string()),
        }
    }

    fn session(user: Identity) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now(),
            user,
        }
    }

    #[test]
    fn initial_check_resolves_unknown() {
        let ana = identity();
        assert_eq!(
            transition(&SessionState::Unknown, &SessionEvent::Initial(Some(ana.clone()))),
            SessionState::Authenticated(ana)
        );
        assert_eq!(
            transition(&SessionState::Unknown, &SessionEvent::Initial(None)),
            SessionState::Unauthenticated
        );
    }

    #[test]
    fn initial_check_does_not_override_live_events() {
        let ana = identity();
        let state = SessionState::Authenticated(ana.clone());
        assert_eq!(transition(&state, &SessionEvent::Initial(None)), state);
        assert_eq!(
            transition(
                &SessionState::Unauthenticated,
                &SessionEvent::Initial(Some(ana))
            ),
            SessionState::Unauthenticated
        );
    }

    #[test]
    fn sign_in_and_out_flip_any_state() {
        let ana = identity();
        let bob = identity();
        for state in [
            SessionState::Unknown,
            SessionState::Unauthenticated,
            SessionState::Authenticated(bob.clone()),
        ] {
            assert_eq!(
                transition(&state, &SessionEvent::SignedIn(ana.clone())),
                SessionState::Authenticated(ana.clone())
            );
            assert_eq!(
                transition(&state, &SessionEvent::SignedOut),
                SessionState::Unauthenticated
            );
            assert_eq!(transition(&state, &SessionEvent::Ignored), state);
        }
    }

    #[test]
    fn provider_events_map_to_session_events() {
        let ana = identity();
        assert_eq!(
            SessionEvent::from(&AuthEvent::signed_in(session(ana.clone()))),
            SessionEvent::SignedIn(ana.clone())
        );
        assert_eq!(
            SessionEvent::from(&AuthEvent::signed_out()),
            SessionEvent::SignedOut
        );
        assert_eq!(
            SessionEvent::from(&AuthEvent::token_refreshed(session(ana))),
            SessionEvent::Ignored
        );

        let without_session = AuthEvent {
            kind: AuthEventKind::SignedIn,
            session: None,
        };
        assert_eq!(SessionEvent::from(&without_session), SessionEvent::Ignored);
    }

    #[test]
    fn state_helpers() {
        let ana = identity();
        let state = SessionState::Authenticated(ana.clone());
        assert_eq!(state.identity(), Some(&ana));
        assert!(state.is_authenticated());
        assert!(state.is_resolved());
        assert!(!SessionState::Unknown.is_resolved());
        assert!(SessionState::Unauthenticated.identity().is_none());
    }
}
