//! Supabase auth (GoTrue) and data (PostgREST) clients.
//!
//! # Architecture
//!
//! - Supabase is the source of truth: no local persistence, direct REST calls
//! - Catalog lists are cached in memory via `moka` (TTL from configuration)
//! - Every request carries the project's anonymous key in `apikey`; user
//!   calls additionally send the user's access token as the bearer
//!
//! # APIs
//!
//! ## Auth (`/auth/v1`)
//! - Password and refresh-token grants, sign-up, current user, logout
//!
//! ## Data (`/rest/v1`)
//! - `products` joined with the producer's business name
//! - `profiles` of type `producer` with their products embedded

mod auth;
mod cache;
mod catalog;
pub mod types;

pub use auth::AuthClient;
pub use catalog::CatalogClient;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        /// Machine-readable error code, when the service sends one.
        code: Option<String>,
        message: String,
    },

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error code or message of an API error contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        match self {
            Self::Api { code, message, .. } => {
                code.as_deref().is_some_and(|c| c.contains(needle))
                    || message.to_lowercase().contains(needle)
            }
            _ => false,
        }
    }
}

/// Error body shapes used by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ApiErrorBody {
    fn into_parts(self, fallback: &str) -> (Option<String>, String) {
        let code = self.error_code.or(self.error);
        let message = self
            .error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_else(|| fallback.chars().take(200).collect());
        (code, message)
    }
}

/// Shared HTTP plumbing for the Supabase clients.
#[derive(Clone)]
pub(crate) struct SupabaseHttp {
    inner: Arc<SupabaseHttpInner>,
}

struct SupabaseHttpInner {
    client: reqwest::Client,
    project_url: Url,
    anon_key: SecretString,
}

impl SupabaseHttp {
    pub(crate) fn new(config: &SupabaseConfig) -> Self {
        let mut project_url = config.url.clone();
        if !project_url.path().ends_with('/') {
            let path = format!("{}/", project_url.path());
            project_url.set_path(&path);
        }

        Self {
            inner: Arc::new(SupabaseHttpInner {
                client: reqwest::Client::new(),
                project_url,
                anon_key: config.anon_key.clone(),
            }),
        }
    }

    /// Resolve a project-relative path such as `auth/v1/user`.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.project_url.join(path)?)
    }

    /// Start a request with the API key and a bearer token.
    ///
    /// Without a user token the anonymous key doubles as the bearer.
    pub(crate) fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(bearer.unwrap_or(anon_key))
    }

    /// Send a request and parse a JSON response.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request and discard the response body.
    pub(crate) async fn execute_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send(request).await.map(drop)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let (code, message) = serde_json::from_str::<ApiErrorBody>(&body)
                .unwrap_or_default()
                .into_parts(&body);
            tracing::debug!(
                status = %status,
                code = ?code,
                message = %message,
                "Supabase returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(body)
    }
}
