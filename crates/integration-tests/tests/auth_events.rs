//! Integration tests for provider sessions against a fake auth backend.
//!
//! Every way the provider session can end must reach a subscribed
//! `SessionState` as an auth event.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use twin_gain_core::{Email, Role};
use twin_gain_integration_tests::backend::{CONSUMER_EMAIL, CONSUMER_ID, FakeBackend, PASSWORD};
use twin_gain_integration_tests::config_for;
use twin_gain_storefront::services::AuthSession;
use twin_gain_storefront::session::{AuthEvent, AuthSubscription, IdentityProvider, SessionState};
use twin_gain_storefront::supabase::AuthClient;
use twin_gain_storefront::supabase::types::AuthTokens;

fn session(backend: &FakeBackend, tokens: Option<AuthTokens>) -> AuthSession {
    AuthSession::new(AuthClient::from_config(&config_for(&backend.url())), tokens)
}

fn consumer_email() -> Email {
    Email::parse(CONSUMER_EMAIL).unwrap()
}

/// Record every event the session emits.
fn record(auth: &AuthSession) -> (Arc<Mutex<Vec<&'static str>>>, AuthSubscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = auth.on_auth_change(Box::new(move |event: &AuthEvent| {
        sink.lock().unwrap().push(event.name());
    }));
    (events, subscription)
}

// =============================================================================
// Session End
// =============================================================================

#[tokio::test]
async fn test_rejected_refresh_signs_out_subscribed_state() {
    let backend = FakeBackend::start().await;
    backend.reject_refresh();
    let auth = session(&backend, None);
    let state = SessionState::new();
    let _subscription = state.subscribe(&auth).unwrap();

    auth.sign_in(&consumer_email(), PASSWORD).await.unwrap();
    assert_eq!(
        state.current_identity().map(|i| i.role),
        Some(Role::Consumer)
    );

    assert_eq!(auth.refresh().await.unwrap(), None);
    assert!(auth.tokens().is_none());
    assert!(state.current_identity().is_none());
}

#[tokio::test]
async fn test_rejected_access_token_emits_signed_out() {
    let backend = FakeBackend::start().await;
    let auth = session(
        &backend,
        Some(AuthTokens {
            access_token: "revoked".to_string(),
            refresh_token: "refresh.consumer-1.0".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }),
    );
    let (events, _recorder) = record(&auth);

    let state = SessionState::new();
    state.initialize(&auth).await.unwrap();

    assert!(state.current_identity().is_none());
    assert!(auth.tokens().is_none());
    assert_eq!(*events.lock().unwrap(), ["signed_out"]);
}

#[tokio::test]
async fn test_sign_out_emits_signed_out() {
    let backend = FakeBackend::start().await;
    let auth = session(&backend, None);
    let state = SessionState::new();
    let _subscription = state.subscribe(&auth).unwrap();
    let (events, _recorder) = record(&auth);

    auth.sign_in(&consumer_email(), PASSWORD).await.unwrap();
    auth.sign_out().await;

    assert!(state.current_identity().is_none());
    assert_eq!(*events.lock().unwrap(), ["signed_in", "signed_out"]);
}

// =============================================================================
// Token Refresh
// =============================================================================

#[tokio::test]
async fn test_expired_tokens_refresh_once_for_concurrent_callers() {
    let backend = FakeBackend::start().await;
    backend.expire_new_sessions();
    let auth = session(&backend, None);
    let state = SessionState::new();
    let _subscription = state.subscribe(&auth).unwrap();
    let (events, _recorder) = record(&auth);

    auth.sign_in(&consumer_email(), PASSWORD).await.unwrap();
    let before = auth.tokens().unwrap();

    tokio::join!(auth.refresh_if_expired(), auth.refresh_if_expired());

    assert_eq!(backend.refresh_grants(), 1);
    let after = auth.tokens().unwrap();
    assert_ne!(after.access_token, before.access_token);
    assert!(!after.is_expired(Utc::now()));
    assert_eq!(
        state.current_identity().map(|i| i.id.as_str().to_string()),
        Some(CONSUMER_ID.to_string())
    );
    assert_eq!(*events.lock().unwrap(), ["signed_in", "token_refreshed"]);
}

#[tokio::test]
async fn test_fresh_tokens_are_not_refreshed() {
    let backend = FakeBackend::start().await;
    let auth = session(&backend, None);

    auth.sign_in(&consumer_email(), PASSWORD).await.unwrap();
    auth.refresh_if_expired().await;

    assert_eq!(backend.refresh_grants(), 0);
}

#[tokio::test]
async fn test_expired_tokens_with_rejected_refresh_sign_out() {
    let backend = FakeBackend::start().await;
    backend.expire_new_sessions();
    backend.reject_refresh();
    let auth = session(&backend, None);
    let state = SessionState::new();
    let _subscription = state.subscribe(&auth).unwrap();

    auth.sign_in(&consumer_email(), PASSWORD).await.unwrap();
    auth.refresh_if_expired().await;

    assert!(state.current_identity().is_none());
    assert!(auth.tokens().is_none());
}
