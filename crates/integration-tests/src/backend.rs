//! In-process stand-in for the Supabase auth and data APIs.
//!
//! Serves just enough of GoTrue (`/auth/v1`) and PostgREST (`/rest/v1`) for
//! signed-in flows to run end to end. Two accounts exist, both with the
//! password [`PASSWORD`]: [`CONSUMER_EMAIL`] and [`PRODUCER_EMAIL`].
//!
//! Tokens encode the user they belong to (`access.<user>.<n>`), so no token
//! table is needed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use url::Url;

/// Password shared by both accounts.
pub const PASSWORD: &str = "secret123";
/// Email of the consumer account.
pub const CONSUMER_EMAIL: &str = "shopper@example.com";
/// Email of the producer account.
pub const PRODUCER_EMAIL: &str = "maker@example.com";
/// User ID of the consumer account.
pub const CONSUMER_ID: &str = "consumer-1";
/// User ID of the producer account.
pub const PRODUCER_ID: &str = "producer-1";

/// Lifetime of refreshed access tokens, in seconds.
const REFRESHED_TTL_SECS: i64 = 3600;

struct Knobs {
    /// `expires_in` for password grants.
    access_ttl: AtomicI64,
    refresh_accepted: AtomicBool,
    refresh_grants: AtomicUsize,
    issued: AtomicUsize,
}

/// A running fake backend.
#[derive(Clone)]
pub struct FakeBackend {
    url: Url,
    knobs: Arc<Knobs>,
}

impl FakeBackend {
    /// Start serving on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let knobs = Arc::new(Knobs {
            access_ttl: AtomicI64::new(REFRESHED_TTL_SECS),
            refresh_accepted: AtomicBool::new(true),
            refresh_grants: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/logout", post(logout))
            .route("/rest/v1/products", get(products))
            .route("/rest/v1/profiles", get(profiles))
            .with_state(Arc::clone(&knobs));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind fake backend: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("fake backend has no address: {e}"));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = Url::parse(&format!("http://{addr}"))
            .unwrap_or_else(|e| panic!("invalid fake backend URL: {e}"));
        Self { url, knobs }
    }

    /// Base URL to use as the Supabase project URL.
    #[must_use]
    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// Issue password-grant access tokens that are already expired.
    pub fn expire_new_sessions(&self) {
        self.knobs.access_ttl.store(0, Ordering::SeqCst);
    }

    /// Answer refresh grants with `400 Invalid Refresh Token`.
    pub fn reject_refresh(&self) {
        self.knobs.refresh_accepted.store(false, Ordering::SeqCst);
    }

    /// Number of refresh grants received.
    #[must_use]
    pub fn refresh_grants(&self) -> usize {
        self.knobs.refresh_grants.load(Ordering::SeqCst)
    }
}

fn account_for_email(email: &str) -> Option<&'static str> {
    match email {
        CONSUMER_EMAIL => Some(CONSUMER_ID),
        PRODUCER_EMAIL => Some(PRODUCER_ID),
        _ => None,
    }
}

fn user_json(user_id: &str) -> Option<Value> {
    let (email, kind) = match user_id {
        CONSUMER_ID => (CONSUMER_EMAIL, "consumer"),
        PRODUCER_ID => (PRODUCER_EMAIL, "producer"),
        _ => return None,
    };
    Some(json!({
        "id": user_id,
        "email": email,
        "user_metadata": { "type": kind },
    }))
}

/// The user a `<kind>.<user>.<n>` token belongs to.
fn token_user<'a>(token: &'a str, kind: &str) -> Option<&'a str> {
    let mut parts = token.split('.');
    (parts.next()? == kind).then_some(())?;
    parts.next()
}

fn session_json(knobs: &Knobs, user_id: &str, expires_in: i64) -> Option<Value> {
    let n = knobs.issued.fetch_add(1, Ordering::SeqCst);
    Some(json!({
        "access_token": format!("access.{user_id}.{n}"),
        "refresh_token": format!("refresh.{user_id}.{n}"),
        "expires_in": expires_in,
        "user": user_json(user_id)?,
    }))
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error_code": code, "msg": message })),
    )
        .into_response()
}

async fn token(
    State(knobs): State<Arc<Knobs>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default();

    let session = match query.get("grant_type").map(String::as_str) {
        Some("password") => account_for_email(field("email"))
            .filter(|_| field("password") == PASSWORD)
            .and_then(|id| session_json(&knobs, id, knobs.access_ttl.load(Ordering::SeqCst))),
        Some("refresh_token") => {
            knobs.refresh_grants.fetch_add(1, Ordering::SeqCst);
            if !knobs.refresh_accepted.load(Ordering::SeqCst) {
                return error(
                    StatusCode::BAD_REQUEST,
                    "refresh_token_not_found",
                    "Invalid Refresh Token: Refresh Token Not Found",
                );
            }
            token_user(field("refresh_token"), "refresh")
                .and_then(|id| session_json(&knobs, id, REFRESHED_TTL_SECS))
        }
        _ => None,
    };

    match session {
        Some(session) => Json(session).into_response(),
        None => error(
            StatusCode::BAD_REQUEST,
            "invalid_credentials",
            "Invalid login credentials",
        ),
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn user(headers: HeaderMap) -> Response {
    match bearer(&headers)
        .and_then(|token| token_user(token, "access"))
        .and_then(user_json)
    {
        Some(user) => Json(user).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "bad_jwt", "invalid JWT"),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn products() -> Json<Value> {
    Json(json!([
        {
            "id": "p1",
            "name": "Cold Pressed Groundnut Oil",
            "description": "Stone-pressed in small batches.",
            "price": 100,
            "category": "Organic Foods",
            "images": [],
            "stock": 10,
            "producer_id": PRODUCER_ID,
            "producer": { "business_name": "Green Acres" }
        },
        {
            "id": "p2",
            "name": "Handloom Cotton Towel",
            "description": null,
            "price": 250,
            "category": "Handicrafts",
            "images": ["https://img.example/towel.jpg"],
            "stock": 0,
            "producer_id": PRODUCER_ID,
            "producer": { "business_name": "Green Acres" }
        }
    ]))
}

async fn profiles() -> Json<Value> {
    Json(json!([]))
}
