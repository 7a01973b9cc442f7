//! Hosted checkout client.
//!
//! Turns a cart into a payment session on the checkout service and works out
//! where to send the browser. Payment itself happens entirely on the hosted
//! page.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use twin_gain_core::Cart;

use crate::config::StorefrontConfig;

/// Errors that can occur when creating a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing with a positive quantity to pay for.
    #[error("cart has no items to check out")]
    EmptyCart,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The session cannot be turned into a redirect URL.
    #[error("Invalid checkout redirect: {0}")]
    InvalidRedirect(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    items: Vec<CheckoutLine<'a>>,
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutLine<'a> {
    product_id: &'a str,
    name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    quantity: u32,
    image: &'a str,
}

/// A payment session created by the checkout service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted page URL, when the service returns one.
    pub url: Option<String>,
}

impl CheckoutSession {
    /// Where to send the browser: the returned URL, or `{base}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidRedirect` if neither yields a valid URL.
    pub fn redirect_url(&self, base: &Url) -> Result<Url, CheckoutError> {
        if let Some(url) = &self.url {
            return Url::parse(url).map_err(|e| CheckoutError::InvalidRedirect(e.to_string()));
        }

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| CheckoutError::InvalidRedirect(format!("{base} cannot be a base")))?
            .pop_if_empty()
            .push(&self.id);
        Ok(url)
    }
}

/// Checkout service client.
#[derive(Clone)]
pub struct CheckoutClient {
    client: reqwest::Client,
    session_url: Url,
    redirect_base: Url,
    success_url: String,
    cancel_url: String,
}

impl CheckoutClient {
    /// Create a checkout client.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            session_url: config.checkout.session_url.clone(),
            redirect_base: config.checkout.redirect_base.clone(),
            success_url: config.absolute_url("/checkout/success"),
            cancel_url: config.absolute_url("/cart"),
        }
    }

    /// Base URL of the hosted payment page.
    #[must_use]
    pub const fn redirect_base(&self) -> &Url {
        &self.redirect_base
    }

    /// Create a payment session for the cart's non-empty lines.
    ///
    /// Not retried; the cart is never modified.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if every line has quantity zero,
    /// or an HTTP/API/parse error from the checkout service.
    #[instrument(skip(self, cart), fields(lines = cart.len()))]
    pub async fn create_session(&self, cart: &Cart) -> Result<CheckoutSession, CheckoutError> {
        let request = build_request(cart, &self.success_url, &self.cancel_url)?;

        let response = self
            .client
            .post(self.session_url.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CheckoutError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let session: CheckoutSession = serde_json::from_str(&body)?;
        tracing::info!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }
}

fn build_request<'a>(
    cart: &'a Cart,
    success_url: &'a str,
    cancel_url: &'a str,
) -> Result<CheckoutRequest<'a>, CheckoutError> {
    let items: Vec<CheckoutLine<'a>> = cart
        .items()
        .iter()
        .filter(|item| item.quantity > 0)
        .map(|item| CheckoutLine {
            product_id: item.product_id.as_str(),
            name: &item.name,
            price: item.unit_price.amount(),
            quantity: item.quantity,
            image: &item.image_ref,
        })
        .collect();

    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    Ok(CheckoutRequest {
        items,
        success_url,
        cancel_url,
    })
}
