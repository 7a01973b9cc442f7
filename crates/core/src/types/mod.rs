//! Core types for Twin Gain.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use price::{CurrencyCode, Price, PriceError};
pub use role::{Role, RoleParseError};
