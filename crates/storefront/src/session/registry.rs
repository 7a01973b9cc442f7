//! Per-client state and the registry that owns it.
//!
//! A client is one browser session. Its [`ClientState`] bundles the identity
//! state, the cart, the provider session and the live auth subscription.
//! Entries expire after a period of inactivity; dropping the last handle to a
//! `ClientState` releases its subscription.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use twin_gain_core::{Cart, Identity};

use super::{SessionState, SessionSubscription};
use crate::services::AuthSession;
use crate::supabase::AuthClient;
use crate::supabase::types::AuthTokens;

/// Everything the storefront keeps in memory for one client.
pub struct ClientState {
    session: SessionState,
    cart: Mutex<Cart>,
    auth: AuthSession,
    _subscription: Option<SessionSubscription>,
}

impl ClientState {
    /// Bind a fresh identity state to `auth`: subscribe first so no event is
    /// missed, then resolve the initial identity.
    pub async fn start(auth: AuthSession) -> Self {
        let session = SessionState::new();
        let subscription = session
            .subscribe(&auth)
            .map_err(|e| warn!(error = %e, "Failed to subscribe to auth changes"))
            .ok();
        if let Err(e) = session.initialize(&auth).await {
            warn!(error = %e, "Failed to initialize session state");
        }

        Self {
            session,
            cart: Mutex::new(Cart::new()),
            auth,
            _subscription: subscription,
        }
    }

    /// The identity the route guard sees.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session.current_identity()
    }

    /// The client's identity state.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// The client's identity provider session.
    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Run one synchronous step against the cart.
    pub fn with_cart<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        f(&mut self.cart.lock())
    }

    /// Copy of the cart for rendering or checkout.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.cart.lock().clone()
    }
}

/// Registry of live clients keyed by the ID stored in their cookie session.
#[derive(Clone)]
pub struct ClientRegistry {
    auth: AuthClient,
    clients: Cache<Uuid, Arc<ClientState>>,
}

impl ClientRegistry {
    /// Create a registry whose entries expire after `idle_timeout` without use.
    #[must_use]
    pub fn new(auth: AuthClient, idle_timeout: Duration) -> Self {
        let clients = Cache::builder()
            .time_to_idle(idle_timeout)
            .eviction_listener(|id: Arc<Uuid>, _client, cause| {
                debug!(client_id = %id, ?cause, "Client state evicted");
            })
            .build();

        Self { auth, clients }
    }

    /// Look up a client, starting it from `tokens` if it is not in memory.
    pub async fn get_or_start(&self, id: Uuid, tokens: Option<AuthTokens>) -> Arc<ClientState> {
        let auth = self.auth.clone();
        let entry = self
            .clients
            .entry(id)
            .or_insert_with(async move {
                debug!(client_id = %id, resumed = tokens.is_some(), "Starting client state");
                Arc::new(ClientState::start(AuthSession::new(auth, tokens)).await)
            })
            .await;

        entry.into_value()
    }

    /// Drop clients that have been idle past the timeout now, instead of on
    /// the cache's next housekeeping pass.
    pub async fn evict_idle(&self) {
        self.clients.run_pending_tasks().await;
    }

    /// Number of clients in memory, including any not yet swept.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.clients.entry_count()
    }

    /// Whether no client is in memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
