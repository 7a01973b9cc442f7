//! Integration tests for signed-in storefront flows.
//!
//! A [`Browser`] drives one router instance and carries the session cookie
//! between requests, the way a real browser would. Auth and catalog calls go
//! to an in-process fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;
use uuid::Uuid;

use twin_gain_integration_tests::backend::{
    CONSUMER_EMAIL, FakeBackend, PASSWORD, PRODUCER_EMAIL,
};
use twin_gain_integration_tests::config_for;
use twin_gain_storefront::routes;
use twin_gain_storefront::session::ClientRegistry;
use twin_gain_storefront::state::AppState;
use twin_gain_storefront::supabase::AuthClient;

/// One browser against one storefront.
struct Browser {
    app: axum::Router,
    cookie: Option<String>,
}

impl Browser {
    fn new(backend: &FakeBackend) -> Self {
        Self {
            app: routes::app(AppState::new(config_for(&backend.url()))),
            cookie: None,
        }
    }

    async fn send(&mut self, request: axum::http::request::Builder, body: Body) -> Response {
        let request = match &self.cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        };
        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    async fn get(&mut self, path: &str) -> Response {
        self.send(Request::builder().uri(path), Body::empty()).await
    }

    async fn post(&mut self, path: &str, form: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(form.to_string()),
        )
        .await
    }

    async fn login(&mut self, path: &str, email: &str) -> Response {
        let email = email.replace('@', "%40");
        self.post(path, &format!("email={email}&password={PASSWORD}"))
            .await
    }
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Sign In and Route Guard
// =============================================================================

#[tokio::test]
async fn test_login_lands_on_own_dashboard() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);

    let response = browser.login("/consumer/login", CONSUMER_EMAIL).await;
    assert_eq!(location(&response), Some("/consumer/dashboard"));

    let response = browser.get("/consumer/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(CONSUMER_EMAIL));
}

#[tokio::test]
async fn test_wrong_role_is_sent_to_own_dashboard() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;

    let response = browser.get("/producer/dashboard").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/consumer/dashboard"));
}

#[tokio::test]
async fn test_producer_login_through_consumer_page_uses_account_role() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);

    let response = browser.login("/consumer/login", PRODUCER_EMAIL).await;
    assert_eq!(location(&response), Some("/producer/dashboard"));

    let response = browser.get("/cart").await;
    assert_eq!(location(&response), Some("/producer/dashboard"));

    let response = browser.get("/producer/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Cold Pressed Groundnut Oil"));
}

#[tokio::test]
async fn test_wrong_password_returns_to_login_with_error() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);

    let response = browser
        .post(
            "/consumer/login",
            "email=shopper%40example.com&password=wrong-password",
        )
        .await;
    assert_eq!(
        location(&response),
        Some("/consumer/login?error=credentials")
    );

    let response = browser.get("/consumer/dashboard").await;
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_sign_out_resets_identity() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;

    let response = browser.post("/auth/logout", "").await;
    assert_eq!(location(&response), Some("/"));

    let response = browser.get("/consumer/dashboard").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/"));
}

// =============================================================================
// Token Expiry
// =============================================================================

#[tokio::test]
async fn test_expired_session_is_refreshed_on_next_request() {
    let backend = FakeBackend::start().await;
    backend.expire_new_sessions();
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;

    let response = browser.get("/consumer/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.refresh_grants(), 1);

    // The refreshed tokens are current; no second refresh.
    browser.get("/consumer/dashboard").await;
    assert_eq!(backend.refresh_grants(), 1);
}

#[tokio::test]
async fn test_expired_session_with_revoked_refresh_token_is_signed_out() {
    let backend = FakeBackend::start().await;
    backend.expire_new_sessions();
    backend.reject_refresh();
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;

    let response = browser.get("/consumer/dashboard").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/"));
}

// =============================================================================
// Cart and Checkout
// =============================================================================

#[tokio::test]
async fn test_decrement_to_zero_keeps_the_line() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;

    let response = browser
        .post("/cart/add", "product_id=p1&return_to=%2Fproducts")
        .await;
    assert_eq!(location(&response), Some("/products"));
    browser.post("/cart/add", "product_id=p1").await;
    browser.post("/cart/decrement", "product_id=p1").await;
    let response = browser.post("/cart/decrement", "product_id=p1").await;
    assert_eq!(location(&response), Some("/cart"));

    let response = browser.get("/cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Cold Pressed Groundnut Oil"));
    assert!(page.contains("<span>0</span>"));
    assert!(page.contains("₹0.00"));
    assert!(!page.contains("Your cart is empty."));

    // Removing is the only way a line leaves the cart.
    browser.post("/cart/remove", "product_id=p1").await;
    let page = body_text(browser.get("/cart").await).await;
    assert!(page.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_out_of_stock_product_is_not_added() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;

    let response = browser.post("/cart/add", "product_id=p2").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let page = body_text(browser.get("/cart").await).await;
    assert!(page.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_checkout_success_clears_the_cart() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;
    browser.post("/cart/add", "product_id=p1").await;

    let page = body_text(browser.get("/cart").await).await;
    assert!(page.contains("₹100.00"));

    let response = browser.get("/checkout/success").await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(browser.get("/cart").await).await;
    assert!(page.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_failed_checkout_keeps_the_cart() {
    let backend = FakeBackend::start().await;
    let mut browser = Browser::new(&backend);
    browser.login("/consumer/login", CONSUMER_EMAIL).await;
    browser.post("/cart/add", "product_id=p1").await;

    // The payment service in the test configuration is unreachable.
    let response = browser.post("/checkout", "").await;
    assert_eq!(location(&response), Some("/cart?error=checkout"));

    let page = body_text(browser.get("/cart").await).await;
    assert!(page.contains("Cold Pressed Groundnut Oil"));
}

// =============================================================================
// Client Eviction
// =============================================================================

#[tokio::test]
async fn test_idle_eviction_releases_client_and_subscription() {
    let backend = FakeBackend::start().await;
    let registry = ClientRegistry::new(
        AuthClient::from_config(&config_for(&backend.url())),
        Duration::from_millis(50),
    );
    let id = Uuid::new_v4();

    let client = registry.get_or_start(id, None).await;
    assert!(client.session().is_subscribed());
    let weak = Arc::downgrade(&client);
    drop(client);

    tokio::time::sleep(Duration::from_millis(150)).await;
    registry.evict_idle().await;

    // The registry held the last handle; the subscription went with it.
    assert!(weak.upgrade().is_none());
    assert!(registry.is_empty());

    let restarted = registry.get_or_start(id, None).await;
    assert!(restarted.session().is_subscribed());
    assert!(restarted.identity().is_none());
}
