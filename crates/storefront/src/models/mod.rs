//! Types stored in the cookie session.

pub mod session;

pub use session::{StoredClient, keys as session_keys};
