//! Identity provider contract and auth-change listener registry.

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use twin_gain_core::Identity;

/// An authentication state change pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in (password grant or sign-up with an immediate session).
    SignedIn(Identity),
    /// The session ended.
    SignedOut,
    /// Tokens were rotated; carries the user the new tokens belong to.
    TokenRefreshed(Identity),
}

impl AuthEvent {
    /// The identity carried by the event's session, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) | Self::TokenRefreshed(identity) => Some(identity),
            Self::SignedOut => None,
        }
    }

    /// Event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
        }
    }
}

/// Callback invoked for every auth event.
pub type AuthListener = Box<dyn Fn(&AuthEvent) + Send + Sync>;

/// Source of the current identity and of auth-change notifications.
pub trait IdentityProvider: Send + Sync {
    type Error: std::error::Error + Send;

    /// Resolve the identity of the current session, once.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send;

    /// Register a listener. Events are delivered synchronously, in emission
    /// order, until the returned subscription is dropped.
    fn on_auth_change(&self, listener: AuthListener) -> AuthSubscription;
}

struct ListenerTable {
    next_id: u64,
    listeners: Vec<(u64, AuthListener)>,
}

/// Listener registry embedded by providers.
///
/// The table lock is held while listeners run, so listeners must not
/// register or drop subscriptions on the same registry.
#[derive(Clone)]
pub struct AuthListeners {
    table: Arc<Mutex<ListenerTable>>,
}

impl Default for AuthListeners {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthListeners {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(ListenerTable {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Add a listener, returning the handle that removes it on drop.
    pub fn register(&self, listener: AuthListener) -> AuthSubscription {
        let mut table = self.table.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.listeners.push((id, listener));

        AuthSubscription {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Deliver `event` to every registered listener in registration order.
    pub fn emit(&self, event: &AuthEvent) {
        let table = self.table.lock();
        tracing::debug!(
            event = event.name(),
            listeners = table.listeners.len(),
            "Delivering auth event"
        );
        for (_, listener) in &table.listeners {
            listener(event);
        }
    }

    /// Number of live listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().listeners.len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration handle; dropping it unregisters the listener.
#[must_use = "dropping the subscription unregisters the listener immediately"]
pub struct AuthSubscription {
    id: u64,
    table: Weak<Mutex<ListenerTable>>,
}

impl std::fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
