//! Per-client identity state.
//!
//! [`SessionState`] holds the identity the route guard reads. It has exactly
//! two writers: [`SessionState::initialize`], which asks the provider once for
//! the current session, and the listener installed by
//! [`SessionState::subscribe`], which overwrites the identity on every auth
//! event. Everything else only reads.
//!
//! The write counter lets `initialize` detect that an auth event landed while
//! it was awaiting the provider; in that case the event's value is newer and
//! is kept.

pub mod provider;
pub mod registry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};
use twin_gain_core::Identity;

pub use provider::{AuthEvent, AuthListener, AuthListeners, AuthSubscription, IdentityProvider};
pub use registry::{ClientRegistry, ClientState};

/// Misuse of a [`SessionState`] lifecycle operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session state is already initialized")]
    AlreadyInitialized,
    #[error("session state already has a live auth subscription")]
    AlreadySubscribed,
}

#[derive(Debug, Default)]
struct IdentitySlot {
    identity: Option<Identity>,
    writes: u64,
}

impl IdentitySlot {
    fn replace(&mut self, identity: Option<Identity>) {
        self.identity = identity;
        self.writes += 1;
    }
}

/// The current identity of one client, or none.
#[derive(Debug, Default)]
pub struct SessionState {
    slot: Arc<RwLock<IdentitySlot>>,
    initialized: AtomicBool,
    subscribed: Arc<AtomicBool>,
}

impl SessionState {
    /// Create an empty (logged out, uninitialized) state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the initial identity from the provider.
    ///
    /// A provider failure leaves the client logged out and is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyInitialized`] on any call after the first.
    pub async fn initialize<P: IdentityProvider>(&self, provider: &P) -> Result<(), SessionError> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadyInitialized);
        }

        let seen = self.slot.read().writes;
        let identity = match provider.current_session().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Failed to resolve current session; continuing logged out");
                None
            }
        };

        let mut slot = self.slot.write();
        if slot.writes == seen {
            slot.replace(identity);
        } else {
            debug!("Auth event arrived during initialization; keeping the newer identity");
        }
        drop(slot);

        Ok(())
    }

    /// Install the auth-change listener.
    ///
    /// The returned handle keeps the listener alive; dropping it detaches the
    /// listener and allows a new subscription.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadySubscribed`] while a previous
    /// subscription is still live.
    pub fn subscribe<P: IdentityProvider>(
        &self,
        provider: &P,
    ) -> Result<SessionSubscription, SessionError> {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            return Err(SessionError::AlreadySubscribed);
        }

        let slot = Arc::clone(&self.slot);
        let subscription = provider.on_auth_change(Box::new(move |event| {
            debug!(event = event.name(), "Auth state changed");
            slot.write().replace(event.identity().cloned());
        }));

        Ok(SessionSubscription {
            inner: Some(subscription),
            active: Arc::clone(&self.subscribed),
        })
    }

    /// The most recently written identity.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.slot.read().identity.clone()
    }

    /// Whether `initialize` has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Whether a subscription is currently live.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn set_identity(&self, identity: Option<Identity>) {
        self.slot.write().replace(identity);
    }
}

/// Disposal handle for a [`SessionState`] auth subscription.
#[must_use = "dropping the subscription stops identity updates"]
#[derive(Debug)]
pub struct SessionSubscription {
    inner: Option<AuthSubscription>,
    active: Arc<AtomicBool>,
}

impl SessionSubscription {
    /// Detach the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        // Unregister before releasing the slot so no event lands after a
        // replacement subscription is installed.
        drop(self.inner.take());
        self.active.store(false, Ordering::Release);
    }
}
