//! HTTP middleware and extractors for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//!
//! # Extractors
//!
//! - [`CurrentClient`] - the requesting client's cart and identity state
//! - [`RequireRole`] - role-gated access for dashboards, cart and checkout

pub mod client;
pub mod guard;
pub mod session;

pub use client::CurrentClient;
pub use guard::{Consumer, GuardRejection, Producer, RequireRole, RequiredRole};
pub use session::create_session_layer;
