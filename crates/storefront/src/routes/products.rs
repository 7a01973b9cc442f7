//! Product search route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::Uri,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use twin_gain_core::catalog::{ALL_CATEGORIES, CATEGORIES, Product, ProductQuery, ProductSort};

use super::{NavView, OptionView};
use crate::filters;
use crate::middleware::CurrentClient;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image: String,
    pub producer_name: Option<String>,
    pub stock: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_str().to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            image: product.primary_image().to_string(),
            producer_name: product.producer_name.clone(),
            stock: product.stock,
            in_stock: product.in_stock(),
        }
    }
}

/// Query parameters for product search.
#[derive(Debug, Default, Deserialize)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

impl ProductSearchQuery {
    fn to_query(&self) -> ProductQuery {
        ProductQuery {
            term: self.q.clone().unwrap_or_default(),
            category: self.category.clone(),
            sort: ProductSort::from_param(self.sort.as_deref()),
        }
    }
}

/// Product search page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub nav: NavView,
    pub products: Vec<ProductCardView>,
    pub term: String,
    pub categories: Vec<OptionView>,
    pub sorts: Vec<OptionView>,
    pub error: Option<String>,
    pub retry_url: String,
    /// Where "Add to Cart" returns without HTMX.
    pub return_to: String,
}

fn category_options(current: &str) -> Vec<OptionView> {
    std::iter::once(ALL_CATEGORIES)
        .chain(CATEGORIES.iter().copied())
        .map(|category| OptionView::new(category, category, current))
        .collect()
}

fn sort_options(current: ProductSort) -> Vec<OptionView> {
    ProductSort::ALL
        .iter()
        .map(|sort| OptionView::new(sort.as_param(), sort.label(), current.as_param()))
        .collect()
}

/// Display the product search page.
///
/// A catalog failure renders the page with an error and a retry link instead
/// of failing the request.
#[instrument(skip(state, client, uri))]
pub async fn index(
    State(state): State<AppState>,
    client: CurrentClient,
    uri: Uri,
    Query(params): Query<ProductSearchQuery>,
) -> impl IntoResponse {
    let query = params.to_query();
    let return_to = uri
        .path_and_query()
        .map_or_else(|| "/products".to_string(), ToString::to_string);

    let (products, error) = match state.catalog().products().await {
        Ok(products) => (
            query
                .apply(&products)
                .into_iter()
                .map(ProductCardView::from)
                .collect(),
            None,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to load products");
            (
                Vec::new(),
                Some("Failed to load products. Please try again later.".to_string()),
            )
        }
    };

    ProductsIndexTemplate {
        nav: NavView::new(&client),
        products,
        term: query.term.clone(),
        categories: category_options(query.category.as_deref().unwrap_or(ALL_CATEGORIES)),
        sorts: sort_options(query.sort),
        error,
        retry_url: return_to.clone(),
        return_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_defaults() {
        let query = ProductSearchQuery::default().to_query();
        assert!(query.term.is_empty());
        assert!(query.category.is_none());
        assert_eq!(query.sort, ProductSort::from_param(None));
    }

    #[test]
    fn test_category_options_mark_current() {
        let options = category_options(ALL_CATEGORIES);
        assert_eq!(options.len(), CATEGORIES.len() + 1);
        assert!(options.first().is_some_and(|o| o.selected));
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
    }

    #[test]
    fn test_sort_options_cover_every_sort() {
        let options = sort_options(ProductSort::PriceLowToHigh);
        assert_eq!(options.len(), ProductSort::ALL.len());
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
    }
}
