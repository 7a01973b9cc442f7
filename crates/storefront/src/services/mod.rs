//! Services backed by external APIs.
//!
//! - `auth` - Per-client identity provider session (GoTrue)
//! - `checkout` - Hosted payment session creation

pub mod auth;
pub mod checkout;

pub use auth::{AuthError, AuthSession, SignUpOutcome};
pub use checkout::{CheckoutClient, CheckoutError, CheckoutSession};
