//! Producer directory route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use twin_gain_core::ProducerId;
use twin_gain_core::catalog::{ALL_LOCATIONS, LOCATIONS, ProducerProfile, ProducerQuery};

use super::products::ProductCardView;
use super::{NavView, OptionView};
use crate::error::AppError;
use crate::filters;
use crate::middleware::CurrentClient;
use crate::state::AppState;

const DEFAULT_DESCRIPTION: &str =
    "A passionate producer creating quality products for our community.";

/// Products previewed on a directory card.
const FEATURED_PER_CARD: usize = 4;

/// One social media link.
#[derive(Clone)]
pub struct SocialLinkView {
    pub label: &'static str,
    pub url: String,
}

/// Producer display data for templates.
#[derive(Clone)]
pub struct ProducerView {
    pub id: String,
    pub business_name: String,
    pub description: String,
    pub location: Option<String>,
    pub rating: Option<String>,
    pub image: String,
    pub product_count: usize,
    pub social: Vec<SocialLinkView>,
    pub products: Vec<ProductCardView>,
}

impl ProducerView {
    /// Build the view, keeping at most `product_limit` products.
    fn new(producer: &ProducerProfile, product_limit: usize) -> Self {
        let social = [
            ("Facebook", &producer.social.facebook),
            ("Instagram", &producer.social.instagram),
            ("Twitter", &producer.social.twitter),
        ]
        .into_iter()
        .filter_map(|(label, url)| {
            url.as_ref().map(|url| SocialLinkView {
                label,
                url: url.clone(),
            })
        })
        .collect();

        Self {
            id: producer.id.as_str().to_string(),
            business_name: producer.business_name.clone(),
            description: producer
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            location: producer.location.clone(),
            rating: producer.rating.map(|rating| format!("{rating:.1}")),
            image: producer.image().to_string(),
            product_count: producer.products.len(),
            social,
            products: producer
                .products
                .iter()
                .take(product_limit)
                .map(ProductCardView::from)
                .collect(),
        }
    }
}

/// Query parameters for the producer directory.
#[derive(Debug, Default, Deserialize)]
pub struct ProducerSearchQuery {
    pub q: Option<String>,
    pub location: Option<String>,
}

/// Producer directory template.
#[derive(Template, WebTemplate)]
#[template(path = "producers/index.html")]
pub struct ProducersIndexTemplate {
    pub nav: NavView,
    pub producers: Vec<ProducerView>,
    pub term: String,
    pub locations: Vec<OptionView>,
    pub error: Option<String>,
    pub retry_url: String,
}

/// Producer profile template.
#[derive(Template, WebTemplate)]
#[template(path = "producers/show.html")]
pub struct ProducerShowTemplate {
    pub nav: NavView,
    pub producer: ProducerView,
    pub return_to: String,
}

fn location_options(current: &str) -> Vec<OptionView> {
    std::iter::once(ALL_LOCATIONS)
        .chain(LOCATIONS.iter().copied())
        .map(|location| OptionView::new(location, location, current))
        .collect()
}

/// Display the producer directory.
#[instrument(skip(state, client))]
pub async fn index(
    State(state): State<AppState>,
    client: CurrentClient,
    Query(params): Query<ProducerSearchQuery>,
) -> impl IntoResponse {
    let query = ProducerQuery {
        term: params.q.unwrap_or_default(),
        location: params.location,
    };

    let (producers, error) = match state.catalog().producers().await {
        Ok(producers) => (
            query
                .apply(&producers)
                .into_iter()
                .map(|producer| ProducerView::new(producer, FEATURED_PER_CARD))
                .collect(),
            None,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to load producers");
            (
                Vec::new(),
                Some("Failed to load producers. Please try again later.".to_string()),
            )
        }
    };

    ProducersIndexTemplate {
        nav: NavView::new(&client),
        producers,
        locations: location_options(query.location.as_deref().unwrap_or(ALL_LOCATIONS)),
        term: query.term,
        error,
        retry_url: "/producers".to_string(),
    }
}

/// Display a single producer with all of their products.
#[instrument(skip(state, client))]
pub async fn show(
    State(state): State<AppState>,
    client: CurrentClient,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let producer = state.catalog().producer(&ProducerId::new(id)).await?;
    let return_to = format!("/producers/{}", producer.id);

    Ok(ProducerShowTemplate {
        nav: NavView::new(&client),
        producer: ProducerView::new(&producer, usize::MAX),
        return_to,
    })
}
