//! GoTrue REST client.

use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use twin_gain_core::{Email, Role};

use super::types::{GoTrueUser, SignUpResponse, TokenResponse};
use super::{BackendError, SupabaseHttp};

/// Client for the `/auth/v1` endpoints.
#[derive(Clone)]
pub struct AuthClient {
    http: SupabaseHttp,
}

impl AuthClient {
    /// Create an auth client from configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::StorefrontConfig) -> Self {
        Self {
            http: SupabaseHttp::new(&config.supabase),
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<TokenResponse, BackendError> {
        let mut url = self.http.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        self.http
            .execute(self.http.request(Method::POST, url, None).json(&body))
            .await
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 400 for wrong credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn password_grant(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<TokenResponse, BackendError> {
        self.token_grant(
            "password",
            json!({ "email": email.as_str(), "password": password }),
        )
        .await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` if the refresh token is invalid or reused.
    #[instrument(skip_all)]
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse, BackendError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    /// Register a new account tagged with `role`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` if the email is taken or the password is
    /// rejected.
    #[instrument(skip(self, password), fields(email = %email, role = %role))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        role: Role,
    ) -> Result<SignUpResponse, BackendError> {
        let url = self.http.endpoint("auth/v1/signup")?;
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "data": { "type": role.as_str() },
        });

        self.http
            .execute(self.http.request(Method::POST, url, None).json(&body))
            .await
    }

    /// Fetch the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 401 or 403 for an invalid token.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<GoTrueUser, BackendError> {
        let url = self.http.endpoint("auth/v1/user")?;
        self.http
            .execute(self.http.request(Method::GET, url, Some(access_token)))
            .await
    }

    /// Revoke the session an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.http.endpoint("auth/v1/logout")?;
        self.http
            .execute_empty(self.http.request(Method::POST, url, Some(access_token)))
            .await
    }
}
