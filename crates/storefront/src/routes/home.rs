//! Landing and about page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::{instrument, warn};

use super::NavView;
use super::products::ProductCardView;
use crate::filters;
use crate::middleware::CurrentClient;
use crate::state::AppState;

/// Number of products featured on the landing page.
const FEATURED_PRODUCTS: usize = 4;

// =============================================================================
// About Content
// =============================================================================

/// A value proposition shown on the about page.
#[derive(Clone)]
pub struct Pillar {
    pub title: &'static str,
    pub body: &'static str,
}

/// A producer spotlight shown on the about page.
#[derive(Clone)]
pub struct Spotlight {
    pub name: &'static str,
    pub craft: &'static str,
    pub image: &'static str,
    pub description: &'static str,
}

const PILLARS: &[Pillar] = &[
    Pillar {
        title: "Direct Connection",
        body: "We eliminate middlemen by connecting producers directly with consumers, \
               ensuring better prices for both parties.",
    },
    Pillar {
        title: "Quality Assurance",
        body: "Every product on our platform is verified for quality and authenticity, \
               ensuring you get the best.",
    },
    Pillar {
        title: "Supporting Local",
        body: "By choosing Twin Gain, you support local producers and help sustain \
               traditional crafts and farming.",
    },
];

const SPOTLIGHTS: &[Spotlight] = &[
    Spotlight {
        name: "Rajesh Kumar",
        craft: "Handicraft Artisan",
        image: "https://images.unsplash.com/photo-1507679799987-c73779587ccf?w=500&q=80",
        description: "Master craftsman specializing in traditional Indian handicrafts \
                      with 20 years of experience.",
    },
    Spotlight {
        name: "Priya Sharma",
        craft: "Organic Farmer",
        image: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=500&q=80",
        description: "Certified organic farmer growing pesticide-free vegetables and fruits.",
    },
    Spotlight {
        name: "Mohammad Ismail",
        craft: "Textile Weaver",
        image: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=500&q=80",
        description: "Third-generation weaver creating handloom textiles using traditional \
                      techniques.",
    },
];

// =============================================================================
// Templates
// =============================================================================

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    /// First few catalog products; empty when the catalog is unavailable.
    pub featured: Vec<ProductCardView>,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub nav: NavView,
    pub pillars: &'static [Pillar],
    pub spotlights: &'static [Spotlight],
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the landing page.
#[instrument(skip(state, client))]
pub async fn landing(State(state): State<AppState>, client: CurrentClient) -> impl IntoResponse {
    let featured = state.catalog().products().await.map_or_else(
        |e| {
            warn!(error = %e, "Failed to load featured products");
            Vec::new()
        },
        |products| {
            products
                .iter()
                .take(FEATURED_PRODUCTS)
                .map(ProductCardView::from)
                .collect()
        },
    );

    HomeTemplate {
        nav: NavView::new(&client),
        featured,
    }
}

/// Display the about page.
pub async fn about(client: CurrentClient) -> impl IntoResponse {
    AboutTemplate {
        nav: NavView::new(&client),
        pillars: PILLARS,
        spotlights: SPOTLIGHTS,
    }
}
