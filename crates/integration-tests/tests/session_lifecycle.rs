//! Integration tests for per-client identity state.
//!
//! A scripted provider stands in for the auth backend so initialization,
//! auth events and subscription disposal can be ordered deliberately.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::Notify;

use twin_gain_core::{Access, Destination, Role, authorize};
use twin_gain_integration_tests::identity;
use twin_gain_storefront::session::{
    AuthEvent, AuthListener, AuthListeners, AuthSubscription, IdentityProvider, SessionError,
    SessionState,
};

#[derive(Debug, Error)]
#[error("auth backend unreachable")]
struct Unreachable;

/// Provider whose `current_session` can be held open until released.
#[derive(Default)]
struct ScriptedProvider {
    listeners: AuthListeners,
    current: Option<twin_gain_core::Identity>,
    fail: bool,
    gated: bool,
    entered: Notify,
    release: Notify,
    lookups: AtomicUsize,
}

impl ScriptedProvider {
    fn signed_in(role: Role) -> Self {
        Self {
            current: Some(identity("stored", role)),
            ..Self::default()
        }
    }

    fn emit(&self, event: &AuthEvent) {
        self.listeners.emit(event);
    }
}

impl IdentityProvider for ScriptedProvider {
    type Error = Unreachable;

    async fn current_session(&self) -> Result<Option<twin_gain_core::Identity>, Unreachable> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.fail {
            return Err(Unreachable);
        }
        Ok(self.current.clone())
    }

    fn on_auth_change(&self, listener: AuthListener) -> AuthSubscription {
        self.listeners.register(listener)
    }
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_stored_session_resolves_before_first_guard_check() {
    let provider = ScriptedProvider::signed_in(Role::Consumer);
    let state = SessionState::new();
    let _subscription = state.subscribe(&provider).unwrap();

    state.initialize(&provider).await.unwrap();

    assert_eq!(
        authorize(state.current_identity().as_ref(), Role::Consumer),
        Access::Granted
    );
    assert_eq!(provider.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_backend_means_logged_out() {
    let provider = ScriptedProvider {
        fail: true,
        ..ScriptedProvider::default()
    };
    let state = SessionState::new();

    state.initialize(&provider).await.unwrap();

    assert!(state.is_initialized());
    assert!(state.current_identity().is_none());
    assert_eq!(
        authorize(state.current_identity().as_ref(), Role::Producer),
        Access::Redirect(Destination::Landing)
    );
}

#[tokio::test]
async fn test_event_during_initialize_is_not_overwritten() {
    let provider = ScriptedProvider {
        current: Some(identity("stale", Role::Consumer)),
        gated: true,
        ..ScriptedProvider::default()
    };
    let state = SessionState::new();
    let _subscription = state.subscribe(&provider).unwrap();

    let signer = async {
        provider.entered.notified().await;
        provider.emit(&AuthEvent::SignedIn(identity("fresh", Role::Producer)));
        provider.release.notify_one();
    };
    let (result, ()) = tokio::join!(state.initialize(&provider), signer);
    result.unwrap();

    let current = state.current_identity().unwrap();
    assert_eq!(current.id.as_str(), "fresh");
    assert_eq!(current.role, Role::Producer);
}

#[tokio::test]
async fn test_second_initialize_is_rejected_without_lookup() {
    let provider = ScriptedProvider::signed_in(Role::Producer);
    let state = SessionState::new();
    state.initialize(&provider).await.unwrap();

    assert_eq!(
        state.initialize(&provider).await,
        Err(SessionError::AlreadyInitialized)
    );
    assert_eq!(provider.lookups.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Subscription
// =============================================================================

#[test]
fn test_events_apply_in_emission_order() {
    let provider = ScriptedProvider::default();
    let state = SessionState::new();
    let _subscription = state.subscribe(&provider).unwrap();

    provider.emit(&AuthEvent::SignedIn(identity("a", Role::Consumer)));
    provider.emit(&AuthEvent::TokenRefreshed(identity("a", Role::Consumer)));
    provider.emit(&AuthEvent::SignedOut);
    provider.emit(&AuthEvent::SignedIn(identity("b", Role::Producer)));

    let current = state.current_identity().unwrap();
    assert_eq!(current.id.as_str(), "b");
    assert_eq!(
        authorize(Some(&current), Role::Consumer),
        Access::Redirect(Destination::Dashboard(Role::Producer))
    );
}

#[test]
fn test_at_most_one_live_subscription() {
    let provider = ScriptedProvider::default();
    let state = SessionState::new();

    let first = state.subscribe(&provider).unwrap();
    assert_eq!(
        state.subscribe(&provider).unwrap_err(),
        SessionError::AlreadySubscribed
    );
    assert_eq!(provider.listeners.len(), 1);

    first.unsubscribe();
    let _second = state.subscribe(&provider).unwrap();
    assert_eq!(provider.listeners.len(), 1);
}

#[test]
fn test_dropped_subscription_stops_updates() {
    let provider = ScriptedProvider::default();
    let state = SessionState::new();

    let subscription = state.subscribe(&provider).unwrap();
    provider.emit(&AuthEvent::SignedIn(identity("a", Role::Consumer)));
    drop(subscription);

    assert!(!state.is_subscribed());
    assert!(provider.listeners.is_empty());

    provider.emit(&AuthEvent::SignedOut);
    assert_eq!(state.current_identity().unwrap().id.as_str(), "a");
}
