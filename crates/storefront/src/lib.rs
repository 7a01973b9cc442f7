//! Twin Gain Storefront library.
//!
//! Server-rendered marketplace storefront: catalog browsing, per-client
//! identity and cart state, role-gated dashboards and checkout hand-off.
//! Exposed as a library so the binary and the integration tests share it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod supabase;
