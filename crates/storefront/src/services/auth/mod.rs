//! Authentication service.
//!
//! [`AuthSession`] is one client's session with the identity provider: it
//! holds that client's tokens, performs sign-in, sign-up, refresh and
//! sign-out against GoTrue, and pushes an [`AuthEvent`] to its listeners for
//! every change. It is the [`IdentityProvider`] the client's
//! [`SessionState`](crate::session::SessionState) binds to.

mod error;

pub use error::AuthError;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use twin_gain_core::{Email, Identity, Role};

use crate::session::{AuthEvent, AuthListener, AuthListeners, AuthSubscription, IdentityProvider};
use crate::supabase::types::{AuthTokens, GoTrueUser, SignUpResponse};
use crate::supabase::{AuthClient, BackendError};

/// Minimum password length accepted by the auth service.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account was created and a session started.
    SignedIn(Identity),
    /// The account was created but the email must be confirmed first.
    ConfirmationRequired,
}

/// One client's session with the identity provider.
pub struct AuthSession {
    client: AuthClient,
    tokens: RwLock<Option<AuthTokens>>,
    listeners: AuthListeners,
    /// Serializes refreshes so one refresh token is only spent once.
    refreshing: tokio::sync::Mutex<()>,
}

impl AuthSession {
    /// Create a session, optionally resuming from stored tokens.
    #[must_use]
    pub fn new(client: AuthClient, tokens: Option<AuthTokens>) -> Self {
        Self {
            client,
            tokens: RwLock::new(tokens),
            listeners: AuthListeners::new(),
            refreshing: tokio::sync::Mutex::new(()),
        }
    }

    /// Current tokens, if signed in.
    #[must_use]
    pub fn tokens(&self) -> Option<AuthTokens> {
        self.tokens.read().clone()
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email or password.
    /// Returns `AuthError::MissingRole` if the account has no role tag.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        let response = self
            .client
            .password_grant(email, password)
            .await
            .map_err(|e| match e.status() {
                Some(400) => AuthError::InvalidCredentials,
                _ => AuthError::Backend(e),
            })?;

        let (tokens, user) = response.into_parts(Utc::now());
        let identity = resolve_identity(&user).ok_or(AuthError::MissingRole)?;
        self.start(tokens, AuthEvent::SignedIn(identity.clone()));

        info!(user_id = %identity.id, role = %identity.role, "User signed in");
        Ok(identity)
    }

    /// Register a new account with the given role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short or
    /// rejected by the service.
    /// Returns `AuthError::UserAlreadyExists` if the email is registered.
    #[instrument(skip(self, password), fields(email = %email, role = %role))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        role: Role,
    ) -> Result<SignUpOutcome, AuthError> {
        validate_password(password)?;

        let response = self
            .client
            .sign_up(email, password, role)
            .await
            .map_err(classify_sign_up_error)?;

        match response {
            SignUpResponse::Session(session) => {
                let (tokens, user) = session.into_parts(Utc::now());
                let identity = resolve_identity(&user).ok_or(AuthError::MissingRole)?;
                self.start(tokens, AuthEvent::SignedIn(identity.clone()));
                info!(user_id = %identity.id, "User registered and signed in");
                Ok(SignUpOutcome::SignedIn(identity))
            }
            SignUpResponse::User(user) => {
                info!(user_id = %user.id, "User registered; awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired)
            }
        }
    }

    /// Rotate the tokens using the refresh token.
    ///
    /// Returns `None`, forgets the tokens and emits [`AuthEvent::SignedOut`]
    /// if the refresh token is no longer accepted or the user lost their role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without tokens, or `AuthError::Backend`
    /// if the service cannot be reached.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Option<Identity>, AuthError> {
        let refresh_token = self
            .tokens()
            .map(|tokens| tokens.refresh_token)
            .ok_or(AuthError::NotSignedIn)?;

        let response = match self.client.refresh_grant(&refresh_token).await {
            Ok(response) => response,
            Err(e) if matches!(e.status(), Some(400 | 401)) => {
                warn!(error = %e, "Refresh token rejected; clearing session");
                self.end();
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let (tokens, user) = response.into_parts(Utc::now());
        let Some(identity) = resolve_identity(&user) else {
            self.end();
            return Ok(None);
        };
        self.start(tokens, AuthEvent::TokenRefreshed(identity.clone()));
        Ok(Some(identity))
    }

    /// Refresh the tokens if they have expired.
    ///
    /// Concurrent callers wait for one refresh instead of each spending the
    /// refresh token. Backend failures keep the current tokens and are only
    /// logged.
    pub async fn refresh_if_expired(&self) {
        if !self.needs_refresh() {
            return;
        }

        let _guard = self.refreshing.lock().await;
        // Another request may have refreshed while we waited.
        if !self.needs_refresh() {
            return;
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Token refresh failed; keeping current session");
        }
    }

    fn needs_refresh(&self) -> bool {
        self.tokens
            .read()
            .as_ref()
            .is_some_and(|tokens| tokens.is_expired(Utc::now()))
    }

    /// End the session.
    ///
    /// Local state is cleared and listeners are notified even if the remote
    /// logout call fails.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let tokens = self.tokens.write().take();

        if let Some(tokens) = tokens
            && let Err(e) = self.client.logout(&tokens.access_token).await
        {
            warn!(error = %e, "Remote logout failed; session cleared locally");
        }

        self.listeners.emit(&AuthEvent::SignedOut);
        info!("User signed out");
    }

    fn start(&self, tokens: AuthTokens, event: AuthEvent) {
        *self.tokens.write() = Some(tokens);
        self.listeners.emit(&event);
    }

    /// Drop the provider session locally and tell the listeners.
    fn end(&self) {
        self.tokens.write().take();
        self.listeners.emit(&AuthEvent::SignedOut);
    }
}

impl IdentityProvider for AuthSession {
    type Error = AuthError;

    async fn current_session(&self) -> Result<Option<Identity>, AuthError> {
        let Some(tokens) = self.tokens() else {
            return Ok(None);
        };

        if tokens.is_expired(Utc::now()) {
            return self.refresh().await;
        }

        match self.client.get_user(&tokens.access_token).await {
            Ok(user) => {
                let identity = resolve_identity(&user);
                if identity.is_none() {
                    self.end();
                }
                Ok(identity)
            }
            Err(e) if matches!(e.status(), Some(401 | 403)) => {
                warn!(error = %e, "Stored access token rejected; clearing session");
                self.end();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn on_auth_change(&self, listener: AuthListener) -> AuthSubscription {
        self.listeners.register(listener)
    }
}

/// Users without a recognised role tag are treated as logged out.
fn resolve_identity(user: &GoTrueUser) -> Option<Identity> {
    let identity = user.identity();
    if identity.is_none() {
        warn!(
            user_id = %user.id,
            role_tag = ?user.user_metadata.kind,
            "User has no recognised role; treating as logged out"
        );
    }
    identity
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn classify_sign_up_error(error: BackendError) -> AuthError {
    if error.mentions("user_already_exists") || error.mentions("already registered") {
        return AuthError::UserAlreadyExists;
    }
    if error.mentions("weak_password") || error.mentions("password should") {
        let message = match &error {
            BackendError::Api { message, .. } => message.clone(),
            _ => error.to_string(),
        };
        return AuthError::WeakPassword(message);
    }
    AuthError::Backend(error)
}
