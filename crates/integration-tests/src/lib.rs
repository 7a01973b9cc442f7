//! Integration tests for Twin Gain.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p twin-gain-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - identity state against a scripted provider
//! - `guarded_cart` - route guard decisions and cart transitions together
//! - `storefront_routes` - the assembled router, without a live backend
//! - `auth_events` - provider sessions against [`backend::FakeBackend`]
//! - `signed_in_flows` - signed-in requests through the router and the
//!   client registry's idle eviction
//!
//! No test needs network access: the backend URLs in [`test_config`] point
//! at a closed local port, and [`config_for`] points them at an in-process
//! fake.

pub mod backend;

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;

use twin_gain_core::catalog::Product;
use twin_gain_core::{Identity, Price, ProductId, Role, UserId};
use twin_gain_storefront::config::{CheckoutConfig, StorefrontConfig, SupabaseConfig};

/// Parse a URL that is known to be valid.
fn url(s: &str) -> Url {
    Url::parse(s).unwrap_or_else(|e| panic!("invalid test URL {s}: {e}"))
}

/// Storefront configuration whose backends are unreachable.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    config_for(&url("http://127.0.0.1:9"))
}

/// Storefront configuration talking to the Supabase project at `supabase`.
#[must_use]
pub fn config_for(supabase: &Url) -> StorefrontConfig {
    StorefrontConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: url("http://127.0.0.1:3000"),
        supabase: SupabaseConfig {
            url: supabase.clone(),
            anon_key: SecretString::from("k3Yx9-test-anon-key-Qm7Lp2"),
        },
        checkout: CheckoutConfig {
            session_url: url("http://127.0.0.1:9/api/create-checkout-session"),
            redirect_base: url("https://checkout.stripe.com/c/pay"),
        },
        catalog_cache_ttl: Duration::from_secs(60),
        client_idle_timeout: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// An identity with no email.
#[must_use]
pub fn identity(id: &str, role: Role) -> Identity {
    Identity::new(UserId::new(id), None, role)
}

/// An in-stock product priced in whole rupees.
#[must_use]
pub fn product(id: &str, rupees: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: String::new(),
        price: Price::inr(Decimal::from(rupees))
            .unwrap_or_else(|e| panic!("invalid test price {rupees}: {e}")),
        category: "Organic Foods".to_string(),
        images: Vec::new(),
        stock: 10,
        producer_id: None,
        producer_name: None,
    }
}
