//! Authentication error types.

use thiserror::Error;

use crate::supabase::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] twin_gain_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The account carries no producer/consumer role tag.
    #[error("account has no role")]
    MissingRole,

    /// The operation needs a signed-in session.
    #[error("not signed in")]
    NotSignedIn,

    /// Auth service error.
    #[error("auth service error: {0}")]
    Backend(#[from] BackendError),
}
