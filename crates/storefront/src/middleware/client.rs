//! Per-client state extractor.
//!
//! Resolves the cookie session to the client's [`ClientState`], starting it
//! (and resolving its identity) on first use or after an idle eviction.

use std::ops::Deref;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{StoredClient, session_keys};
use crate::session::ClientState;
use crate::state::AppState;

/// The requesting client's in-memory state.
///
/// Derefs to [`ClientState`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(client: CurrentClient) -> impl IntoResponse {
///     let count = client.with_cart(|cart| cart.item_count());
///     format!("{count} items")
/// }
/// ```
pub struct CurrentClient {
    state: Arc<ClientState>,
    session: Session,
    id: Uuid,
}

impl CurrentClient {
    /// Persist the client's current tokens to the cookie session.
    ///
    /// Call after anything that signs the client in or out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self) -> Result<(), tower_sessions::session::Error> {
        let stored = StoredClient {
            id: self.id,
            tokens: self.state.auth().tokens(),
        };
        self.session.insert(session_keys::CLIENT, &stored).await
    }

    /// Issue a new session ID, keeping the stored data.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cycle_session_id(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.cycle_id().await
    }
}

impl Deref for CurrentClient {
    type Target = ClientState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl FromRequestParts<AppState> for CurrentClient {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        let existing: Option<StoredClient> = session.get(session_keys::CLIENT).await?;
        let is_new = existing.is_none();
        let stored = existing.unwrap_or_default();

        let client_state = state
            .clients()
            .get_or_start(stored.id, stored.tokens.clone())
            .await;

        // A live client only learns about expiry here; the refresh (or the
        // sign-out when it is rejected) reaches the identity state as an auth
        // event before the guard reads it.
        client_state.auth().refresh_if_expired().await;

        let client = Self {
            state: client_state,
            session,
            id: stored.id,
        };

        // Tokens may have been refreshed or cleared while resolving identity.
        if is_new || client.auth().tokens() != stored.tokens {
            debug!(client_id = %stored.id, is_new, "Saving client to session");
            client.save().await?;
        }

        Ok(client)
    }
}
