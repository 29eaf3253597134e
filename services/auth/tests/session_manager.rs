//! Session lifecycle against the in-memory identity provider

use std::sync::Arc;
use std::time::Duration;

use auth::memory::InMemoryIdentityProvider;
use auth::{AuthEvent, SessionManager, SessionState};
use common::error::AppError;
use common::validation::FormInput;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

fn login(email: &str, password: &str) -> FormInput {
    FormInput::new()
        .with("email", email)
        .with("password", password)
}

fn setup() -> (Arc<InMemoryIdentityProvider>, SessionManager) {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let manager = SessionManager::start(provider.clone());
    (provider, manager)
}

#[tokio::test]
async fn starts_unknown_and_resolves_to_existing_session() {
    let (provider, manager) = setup();
    let ana = provider.add_account("ana@example.com", "secret1").await;
    provider.set_session(&ana).await;

    assert_eq!(manager.current(), SessionState::Unknown);
    let state = assert_ok!(manager.check_initial_session().await);
    assert_eq!(state, SessionState::Authenticated(ana));
}

#[tokio::test]
async fn resolves_to_unauthenticated_without_session() {
    let (_provider, manager) = setup();

    let state = assert_ok!(manager.check_initial_session().await);
    assert_eq!(state, SessionState::Unauthenticated);
}

#[tokio::test]
async fn failed_session_check_never_stays_unknown() {
    let (provider, manager) = setup();
    provider.fail_session_check(true);

    let err = assert_err!(manager.check_initial_session().await);
    assert!(matches!(err, AppError::Auth { .. }));
    assert_eq!(manager.current(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn invalid_login_forms_never_reach_the_provider() {
    let (provider, manager) = setup();
    provider.add_account("ana@example.com", "secret1").await;

    let invalid = [
        login("", ""),
        login("ana@example.com", ""),
        login("ana@example.com", "12345"),
        login("not-an-email", "secret1"),
        login("ana@", "secret1"),
        FormInput::new(),
    ];

    for form in &invalid {
        let err = assert_err!(manager.sign_in(form).await);
        assert!(err.validation_errors().is_some(), "{:?}", form);
    }

    assert_eq!(provider.sign_in_calls(), 0);
    assert_eq!(manager.current(), SessionState::Unknown);
}

#[tokio::test]
async fn sign_in_authenticates_before_returning() {
    let (provider, manager) = setup();
    let ana = provider.add_account("ana@example.com", "secret1").await;
    assert_ok!(manager.check_initial_session().await);

    let identity = assert_ok!(manager.sign_in(&login("ana@example.com", "secret1")).await);
    assert_eq!(identity, ana);
    assert_eq!(manager.current(), SessionState::Authenticated(ana));
}

#[tokio::test]
async fn rejected_credentials_keep_the_session_unauthenticated() {
    let (provider, manager) = setup();
    provider.add_account("ana@example.com", "secret1").await;
    assert_ok!(manager.check_initial_session().await);

    let err = assert_err!(manager.sign_in(&login("ana@example.com", "wrong-password")).await);
    assert_eq!(
        err.user_message(),
        "Failed to sign in: Invalid login credentials"
    );
    assert_eq!(provider.sign_in_calls(), 1);
    assert_eq!(manager.current(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn provider_notifications_drive_the_state() {
    let (provider, manager) = setup();
    let ana = provider.add_account("ana@example.com", "secret1").await;
    assert_ok!(manager.check_initial_session().await);
    let mut changes = manager.subscribe();

    let session = provider.set_session(&ana).await;
    provider.emit(AuthEvent::signed_in(session));
    let state = timeout(
        Duration::from_secs(1),
        changes.wait_for(|state| state.is_authenticated()),
    )
    .await
    .expect("sign-in notification applied")
    .expect("manager alive")
    .clone();
    assert_eq!(state, SessionState::Authenticated(ana.clone()));

    provider.emit(AuthEvent::token_refreshed(InMemoryIdentityProvider::issue_session(&ana)));
    provider.clear_session().await;
    provider.emit(AuthEvent::signed_out());
    let state = timeout(
        Duration::from_secs(1),
        changes.wait_for(|state| *state == SessionState::Unauthenticated),
    )
    .await
    .expect("sign-out notification applied")
    .expect("manager alive")
    .clone();
    assert_eq!(state, SessionState::Unauthenticated);
}

#[tokio::test]
async fn late_sign_in_notification_does_not_undo_sign_out() {
    let (provider, manager) = setup();
    provider.add_account("ana@example.com", "secret1").await;
    assert_ok!(manager.check_initial_session().await);

    assert_ok!(manager.sign_in(&login("ana@example.com", "secret1")).await);
    assert_ok!(manager.sign_out().await);
    let mut changes = manager.subscribe();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!changes.has_changed().expect("manager alive"));
    assert_eq!(manager.current(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn notifications_that_disagree_with_the_provider_are_dropped() {
    let (provider, manager) = setup();
    let ana = provider.add_account("ana@example.com", "secret1").await;
    assert_ok!(manager.check_initial_session().await);

    provider.emit(AuthEvent::signed_in(InMemoryIdentityProvider::issue_session(&ana)));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(manager.current(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn on_session_event_applies_synchronously() {
    let (provider, manager) = setup();
    let ana = provider.add_account("ana@example.com", "secret1").await;

    let state =
        manager.on_session_event(&AuthEvent::signed_in(InMemoryIdentityProvider::issue_session(&ana)));
    assert_eq!(state, SessionState::Authenticated(ana));

    let state = manager.on_session_event(&AuthEvent::signed_out());
    assert_eq!(state, SessionState::Unauthenticated);
}

#[tokio::test]
async fn sign_out_clears_the_session_even_when_the_provider_fails() {
    let (provider, manager) = setup();
    provider.add_account("ana@example.com", "secret1").await;
    assert_ok!(manager.sign_in(&login("ana@example.com", "secret1")).await);
    provider.fail_sign_out(true);

    let err = assert_err!(manager.sign_out().await);
    assert!(matches!(err, AppError::Auth { .. }));
    assert_eq!(manager.current(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn dropping_the_manager_releases_the_subscription() {
    let (provider, manager) = setup();
    assert_eq!(provider.listener_count(), 1);

    drop(manager);

    timeout(Duration::from_secs(1), async {
        while provider.listener_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listener released");
}
