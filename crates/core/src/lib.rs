//! Twin Gain Core - shared types and client state model.
//!
//! This crate provides the pieces of the marketplace that carry actual
//! invariants, independent of any web framework:
//! - [`cart`] - the per-session shopping cart and its transitions
//! - [`guard`] - the role-gated access decision for dashboards and the cart
//! - [`catalog`] - product and producer read models with search/filter/sort
//! - [`types`] - newtype IDs, prices, emails, roles and identities
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. The storefront binary wires these into request
//! handlers and the external backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod guard;
pub mod types;

pub use cart::{Cart, CartItem};
pub use guard::{Access, Destination, authorize};
pub use types::*;
