//! Checkout route handlers.
//!
//! Checkout hands the cart to the external payment service and sends the
//! browser to the hosted payment page. The cart is only cleared once the
//! payment service returns the shopper to the success page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, instrument};

use super::NavView;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Consumer, RequireRole};
use crate::services::CheckoutError;
use crate::state::AppState;

/// Checkout success page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub nav: NavView,
}

/// Cart page error code for a failed checkout.
fn failure_redirect(err: &CheckoutError) -> Redirect {
    match err {
        CheckoutError::EmptyCart => Redirect::to("/cart?error=empty"),
        _ => Redirect::to("/cart?error=checkout"),
    }
}

/// Start checkout for the consumer's cart.
///
/// On failure the cart is left unchanged and the consumer is returned to the
/// cart page with an error.
#[instrument(skip(state, guard), fields(user_id = %guard.identity.id))]
pub async fn start(State(state): State<AppState>, guard: RequireRole<Consumer>) -> Response {
    let cart = guard.client.cart();

    let redirect = state
        .checkout()
        .create_session(&cart)
        .await
        .and_then(|session| session.redirect_url(state.checkout().redirect_base()));

    match redirect {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            let redirect = failure_redirect(&e);
            AppError::from(e).report();
            redirect.into_response()
        }
    }
}

/// Page the payment service returns to after a successful payment.
pub async fn success(guard: RequireRole<Consumer>) -> impl IntoResponse {
    guard.client.with_cart(twin_gain_core::Cart::clear);
    info!(user_id = %guard.identity.id, "Checkout completed, cart cleared");

    CheckoutSuccessTemplate {
        nav: NavView::new(&guard.client),
    }
}
