//! Role dashboards.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::{instrument, warn};

use twin_gain_core::catalog::Product;
use twin_gain_core::{Identity, ProducerId};

use super::NavView;
use super::cart::CartView;
use super::products::ProductCardView;
use crate::filters;
use crate::middleware::{Consumer, Producer, RequireRole};
use crate::state::AppState;

/// Signed-in account summary.
#[derive(Clone)]
pub struct AccountView {
    pub name: String,
    pub email: Option<String>,
    pub role_label: &'static str,
}

impl From<&Identity> for AccountView {
    fn from(identity: &Identity) -> Self {
        Self {
            name: identity.display_name(),
            email: identity.email.as_ref().map(|e| e.as_str().to_string()),
            role_label: identity.role.label(),
        }
    }
}

/// Consumer dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/consumer.html")]
pub struct ConsumerDashboardTemplate {
    pub nav: NavView,
    pub account: AccountView,
    pub cart: CartView,
}

/// Producer dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/producer.html")]
pub struct ProducerDashboardTemplate {
    pub nav: NavView,
    pub account: AccountView,
    pub products: Vec<ProductCardView>,
    pub product_count: usize,
    pub total_stock: u64,
    pub error: Option<String>,
}

fn total_stock(products: &[Product]) -> u64 {
    products.iter().map(|p| u64::from(p.stock)).sum()
}

/// Display the consumer dashboard.
pub async fn consumer(guard: RequireRole<Consumer>) -> impl IntoResponse {
    let cart = guard.client.cart();

    ConsumerDashboardTemplate {
        nav: NavView::new(&guard.client),
        account: AccountView::from(&guard.identity),
        cart: CartView::from(&cart),
    }
}

/// Display the producer dashboard with the producer's own listings.
#[instrument(skip(state, guard), fields(user_id = %guard.identity.id))]
pub async fn producer(
    State(state): State<AppState>,
    guard: RequireRole<Producer>,
) -> impl IntoResponse {
    // A producer's profile ID is their user ID.
    let producer_id = ProducerId::new(guard.identity.id.as_str());

    let (products, error) = match state.catalog().products_by_producer(&producer_id).await {
        Ok(products) => (products, None),
        Err(e) => {
            warn!(error = %e, "Failed to load producer products");
            (
                Vec::new(),
                Some("Failed to load your products. Please try again later.".to_string()),
            )
        }
    };

    ProducerDashboardTemplate {
        nav: NavView::new(&guard.client),
        account: AccountView::from(&guard.identity),
        product_count: products.len(),
        total_stock: total_stock(&products),
        products: products.iter().map(ProductCardView::from).collect(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use twin_gain_core::{Email, Price, ProductId, Role, UserId};

    fn product(id: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            description: String::new(),
            price: Price::inr(Decimal::ONE).expect("valid price"),
            category: "Spices".to_string(),
            images: Vec::new(),
            stock,
            producer_id: None,
            producer_name: None,
        }
    }

    #[test]
    fn test_total_stock() {
        assert_eq!(total_stock(&[]), 0);
        assert_eq!(total_stock(&[product("a", 3), product("b", 7)]), 10);
    }

    #[test]
    fn test_account_view() {
        let email = Email::parse("maker@example.com").expect("valid email");
        let identity = Identity::new(UserId::new("u1"), Some(email), Role::Producer);
        let view = AccountView::from(&identity);
        assert_eq!(view.email.as_deref(), Some("maker@example.com"));
        assert_eq!(view.role_label, "Producer");
    }
}
