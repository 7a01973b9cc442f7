//! Role-gated route extractor.
//!
//! Wraps [`authorize`] so a handler only runs for an identity holding the
//! required role; every other request is redirected.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;
use twin_gain_core::{Access, Destination, Identity, Role, authorize};

use crate::error::AppError;
use crate::middleware::CurrentClient;
use crate::state::AppState;

/// Compile-time role requirement.
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

/// Marker for consumer-only routes.
pub struct Consumer;

/// Marker for producer-only routes.
pub struct Producer;

impl RequiredRole for Consumer {
    const ROLE: Role = Role::Consumer;
}

impl RequiredRole for Producer {
    const ROLE: Role = Role::Producer;
}

/// Extractor that admits only identities holding `R::ROLE`.
///
/// Anonymous requests go to the landing page and signed-in users with another
/// role go to their own dashboard.
///
/// # Example
///
/// ```rust,ignore
/// async fn producer_dashboard(guard: RequireRole<Producer>) -> impl IntoResponse {
///     format!("Welcome, {}", guard.identity.display_name())
/// }
/// ```
pub struct RequireRole<R: RequiredRole> {
    pub identity: Identity,
    pub client: CurrentClient,
    _role: PhantomData<R>,
}

/// Why a guarded request did not reach its handler.
#[derive(Debug)]
pub enum GuardRejection {
    /// Navigate elsewhere.
    Redirect(Destination),
    /// The client state could not be resolved.
    Client(AppError),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(destination) => Redirect::to(destination.path()).into_response(),
            Self::Client(err) => err.into_response(),
        }
    }
}

impl<R: RequiredRole> FromRequestParts<AppState> for RequireRole<R> {
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let client = CurrentClient::from_request_parts(parts, state)
            .await
            .map_err(GuardRejection::Client)?;
        let identity = client.identity();

        if let Access::Redirect(destination) = authorize(identity.as_ref(), R::ROLE) {
            debug!(
                path = %parts.uri.path(),
                required = %R::ROLE,
                redirect = destination.path(),
                "Route guard redirect"
            );
            return Err(GuardRejection::Redirect(destination));
        }

        // `authorize` only grants a present identity.
        let identity = identity.ok_or(GuardRejection::Redirect(Destination::Landing))?;

        Ok(Self {
            identity,
            client,
            _role: PhantomData,
        })
    }
}
