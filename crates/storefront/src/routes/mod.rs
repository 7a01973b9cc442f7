//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Landing page
//! GET  /about                  - About page
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /products               - Product search (q, category, sort)
//! GET  /producers              - Producer directory (q, location)
//! GET  /producers/{id}         - Producer profile
//!
//! # Auth
//! GET  /consumer/login         - Consumer login page
//! POST /consumer/login         - Consumer login action
//! POST /consumer/register      - Consumer registration
//! GET  /producer/login         - Producer login page
//! POST /producer/login         - Producer login action
//! POST /producer/register      - Producer registration
//! POST /auth/logout            - Logout action
//!
//! # Dashboards (role-gated)
//! GET  /consumer/dashboard     - Consumer dashboard
//! GET  /producer/dashboard     - Producer dashboard
//!
//! # Cart
//! GET  /cart                   - Cart page (consumer)
//! POST /cart/add               - Add one unit (returns count fragment for HTMX)
//! POST /cart/update            - Set quantity (consumer)
//! POST /cart/increment         - Quantity + 1 (consumer)
//! POST /cart/decrement         - Quantity - 1, kept at zero (consumer)
//! POST /cart/remove            - Remove line (consumer)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (consumer)
//! POST /checkout               - Create payment session and redirect
//! GET  /checkout/success       - Return page; clears the cart
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod home;
pub mod producers;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use twin_gain_core::Role;

use crate::middleware::{Consumer, Producer, create_session_layer};
use crate::session::ClientState;
use crate::state::AppState;

// =============================================================================
// Shared View Types
// =============================================================================

/// Signed-in user shown in the navbar.
#[derive(Clone)]
pub struct NavUser {
    pub name: String,
    pub role_label: &'static str,
    pub dashboard_path: &'static str,
    /// Only consumers get a cart link.
    pub is_consumer: bool,
}

/// Navbar data every page template carries.
#[derive(Clone)]
pub struct NavView {
    pub user: Option<NavUser>,
    pub cart_count: u64,
}

impl NavView {
    /// Build the navbar for a client.
    #[must_use]
    pub fn new(client: &ClientState) -> Self {
        Self {
            user: client.identity().map(|identity| NavUser {
                name: identity.display_name(),
                role_label: identity.role.label(),
                dashboard_path: identity.role.dashboard_path(),
                is_consumer: identity.has_role(Role::Consumer),
            }),
            cart_count: client.with_cart(|cart| cart.item_count()),
        }
    }
}

/// One `<option>` in a filter dropdown.
#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    fn new(value: &str, label: &str, current: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: value == current,
        }
    }
}

/// Accept only same-site relative paths as redirect targets.
fn local_path(candidate: Option<&str>, fallback: &str) -> String {
    match candidate {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => fallback.to_string(),
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the consumer routes router.
pub fn consumer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page::<Consumer>).post(auth::login::<Consumer>),
        )
        .route("/register", post(auth::register::<Consumer>))
        .route("/dashboard", get(dashboard::consumer))
}

/// Create the producer routes router.
pub fn producer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page::<Producer>).post(auth::login::<Producer>),
        )
        .route("/register", post(auth::register::<Producer>))
        .route("/dashboard", get(dashboard::producer))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::start))
        .route("/success", get(checkout::success))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/about", get(home::about))
        .route("/products", get(products::index))
        .route("/producers", get(producers::index))
        .route("/producers/{id}", get(producers::show))
        .nest("/consumer", consumer_routes())
        .nest("/producer", producer_routes())
        .route("/auth/logout", post(auth::logout))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// The full application: routes, static assets, sessions and request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(session_layer),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_rejects_offsite_targets() {
        assert_eq!(local_path(Some("/products?q=tea"), "/"), "/products?q=tea");
        assert_eq!(local_path(Some("//evil.example"), "/"), "/");
        assert_eq!(local_path(Some("https://evil.example"), "/"), "/");
        assert_eq!(local_path(None, "/products"), "/products");
    }

    #[test]
    fn test_option_view_selection() {
        let option = OptionView::new("price-low", "Price: Low to High", "price-low");
        assert!(option.selected);
        assert!(!OptionView::new("name", "Name", "price-low").selected);
    }
}
