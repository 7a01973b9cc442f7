//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::CheckoutClient;
use crate::session::ClientRegistry;
use crate::supabase::{AuthClient, CatalogClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like API clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    checkout: CheckoutClient,
    clients: ClientRegistry,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let catalog = CatalogClient::from_config(&config);
        let checkout = CheckoutClient::new(&config);
        let clients = ClientRegistry::new(AuthClient::from_config(&config), config.client_idle_timeout);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                checkout,
                clients,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the checkout client.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutClient {
        &self.inner.checkout
    }

    /// Get a reference to the per-client state registry.
    #[must_use]
    pub fn clients(&self) -> &ClientRegistry {
        &self.inner.clients
    }
}
