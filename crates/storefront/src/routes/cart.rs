//! Cart route handlers.
//!
//! The cart lives in the client's in-memory state. Adding works for anyone
//! browsing the catalog; viewing and editing the cart is consumer-only.
//! Mutations answer HTMX requests with the count badge fragment and an
//! `HX-Trigger: cart-updated` header, and plain form posts with a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, instrument};

use twin_gain_core::catalog::PLACEHOLDER_PRODUCT_IMAGE;
use twin_gain_core::{Cart, CartItem, ProductId};

use super::{NavView, local_path};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Consumer, CurrentClient, RequireRole};
use crate::session::ClientState;
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub image: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let image = if item.image_ref.is_empty() {
            PLACEHOLDER_PRODUCT_IMAGE.to_string()
        } else {
            item.image_ref.clone()
        };

        Self {
            product_id: item.product_id.as_str().to_string(),
            name: item.name.clone(),
            unit_price: item.unit_price.display(),
            quantity: item.quantity,
            line_total: item.line_total().display(),
            image,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    /// Page to return to when the request is not from HTMX.
    pub return_to: Option<String>,
}

/// Set quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    /// Negative values are clamped to zero.
    pub quantity: i64,
}

/// Form data naming a single cart line.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub product_id: String,
}

/// Query parameters for the cart page.
#[derive(Debug, Default, Deserialize)]
pub struct CartPageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub cart: CartView,
    pub error: Option<&'static str>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Map a cart page error code to a user-facing message.
fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "checkout" => Some("We couldn't start checkout. Please try again."),
        "empty" => Some("Your cart is empty."),
        _ => None,
    }
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
}

/// Respond to a cart mutation.
fn mutated(client: &ClientState, headers: &HeaderMap, fallback: &str) -> Response {
    if is_htmx(headers) {
        let count = client.with_cart(|cart| cart.item_count());
        return (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate { count },
        )
            .into_response();
    }
    Redirect::to(fallback).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(guard))]
pub async fn show(
    guard: RequireRole<Consumer>,
    Query(query): Query<CartPageQuery>,
) -> impl IntoResponse {
    let cart = guard.client.cart();

    CartShowTemplate {
        nav: NavView::new(&guard.client),
        cart: CartView::from(&cart),
        error: query.error.as_deref().and_then(error_message),
    }
}

/// Add one unit of a product to the cart.
///
/// The product is resolved from the catalog so the line carries the current
/// name, price and image.
#[instrument(skip(state, client, headers))]
pub async fn add(
    State(state): State<AppState>,
    client: CurrentClient,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let product = state
        .catalog()
        .product(&ProductId::new(form.product_id))
        .await?;

    if !product.in_stock() {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.name
        )));
    }

    client.with_cart(|cart| cart.add_item(product.to_cart_item()));
    debug!(product_id = %product.id, "Added to cart");

    let fallback = local_path(form.return_to.as_deref(), "/products");
    Ok(mutated(&client, &headers, &fallback))
}

/// Set a line's quantity.
#[instrument(skip(guard, headers))]
pub async fn update(
    guard: RequireRole<Consumer>,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    guard
        .client
        .with_cart(|cart| cart.update_quantity(&product_id, form.quantity));

    mutated(&guard.client, &headers, "/cart")
}

/// Raise a line's quantity by one.
#[instrument(skip(guard, headers))]
pub async fn increment(
    guard: RequireRole<Consumer>,
    headers: HeaderMap,
    Form(form): Form<CartLineForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    guard.client.with_cart(|cart| {
        if let Some(item) = cart.get(&product_id).cloned() {
            cart.add_item(item);
        }
    });

    mutated(&guard.client, &headers, "/cart")
}

/// Lower a line's quantity by one. The line stays in the cart at zero.
#[instrument(skip(guard, headers))]
pub async fn decrement(
    guard: RequireRole<Consumer>,
    headers: HeaderMap,
    Form(form): Form<CartLineForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    guard.client.with_cart(|cart| {
        if let Some(quantity) = cart.get(&product_id).map(|item| item.quantity) {
            cart.update_quantity(&product_id, i64::from(quantity) - 1);
        }
    });

    mutated(&guard.client, &headers, "/cart")
}

/// Remove a line from the cart.
#[instrument(skip(guard, headers))]
pub async fn remove(
    guard: RequireRole<Consumer>,
    headers: HeaderMap,
    Form(form): Form<CartLineForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    guard.client.with_cart(|cart| cart.remove_item(&product_id));

    mutated(&guard.client, &headers, "/cart")
}

/// Get cart count badge (HTMX).
pub async fn count(client: CurrentClient) -> impl IntoResponse {
    CartCountTemplate {
        count: client.with_cart(|cart| cart.item_count()),
    }
}
