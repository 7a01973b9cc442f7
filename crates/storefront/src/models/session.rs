//! Session-related types.
//!
//! The cookie session only stores what is needed to rebuild a client after
//! its in-memory state was evicted: the client ID and the provider tokens.
//! The cart is not stored and does not survive eviction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::supabase::types::AuthTokens;

/// Session-stored client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredClient {
    /// Key of the client's entry in the registry.
    pub id: Uuid,
    /// Provider tokens, when signed in.
    pub tokens: Option<AuthTokens>,
}

impl StoredClient {
    /// A new anonymous client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            tokens: None,
        }
    }
}

impl Default for StoredClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Session keys.
pub mod keys {
    /// Key for the [`StoredClient`](super::StoredClient) record.
    pub const CLIENT: &str = "client";
}
