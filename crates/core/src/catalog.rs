//! Catalog read models and in-memory search.
//!
//! Products and producer profiles are fetched from the backend as whole
//! lists; searching, filtering and sorting happen here as linear scans over
//! the fetched collection.

use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::{Price, ProducerId, ProductId};

/// Sentinel category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All Categories";

/// Sentinel location meaning "no location filter".
pub const ALL_LOCATIONS: &str = "All Locations";

/// Categories offered in the product filter, sentinel first.
pub const CATEGORIES: &[&str] = &[
    ALL_CATEGORIES,
    "Organic Foods",
    "Fresh Produce",
    "Handicrafts",
    "Textiles",
    "Spices",
];

/// Locations offered in the producer filter, sentinel first.
pub const LOCATIONS: &[&str] = &[
    ALL_LOCATIONS,
    "Delhi NCR",
    "Mumbai",
    "Bangalore",
    "Chennai",
    "Kolkata",
];

/// Image shown for products without any uploaded image.
pub const PLACEHOLDER_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1590543367665-c5c60e469adf?w=500&q=80";

/// Image shown for producers without a profile image.
pub const PLACEHOLDER_PRODUCER_IMAGE: &str =
    "https://images.unsplash.com/photo-1516594798947-e65505dbb29d?w=800&q=80";

/// A product listed by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub images: Vec<String>,
    pub stock: u32,
    pub producer_id: Option<ProducerId>,
    /// Business name of the producer, when the backend joined it in.
    pub producer_name: Option<String>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, or the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .map_or(PLACEHOLDER_PRODUCT_IMAGE, String::as_str)
    }

    /// Build the cart line for one unit of this product.
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.price,
            quantity: 1,
            image_ref: self.images.first().cloned().unwrap_or_default(),
        }
    }
}

/// Social media links on a producer profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
}

/// A producer's public profile together with their listed products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerProfile {
    pub id: ProducerId,
    pub business_name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f32>,
    pub social: SocialLinks,
    pub profile_image: Option<String>,
    pub products: Vec<Product>,
}

impl ProducerProfile {
    /// Profile image, or the placeholder.
    #[must_use]
    pub fn image(&self) -> &str {
        self.profile_image
            .as_deref()
            .unwrap_or(PLACEHOLDER_PRODUCER_IMAGE)
    }
}

/// Product ordering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    /// Backend order.
    #[default]
    Featured,
    PriceLowToHigh,
    PriceHighToLow,
    Name,
}

impl ProductSort {
    /// All options, in display order.
    pub const ALL: [Self; 4] = [
        Self::Featured,
        Self::PriceLowToHigh,
        Self::PriceHighToLow,
        Self::Name,
    ];

    /// Query-string value.
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLowToHigh => "price-low",
            Self::PriceHighToLow => "price-high",
            Self::Name => "name",
        }
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceLowToHigh => "Price: Low to High",
            Self::PriceHighToLow => "Price: High to Low",
            Self::Name => "Name",
        }
    }

    /// Parse a query-string value, falling back to [`ProductSort::Featured`].
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for ProductSort {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_param() == s)
            .ok_or(())
    }
}

/// Search parameters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Free-text term; empty matches everything.
    pub term: String,
    /// Category name, or `None` / [`ALL_CATEGORIES`] for every category.
    pub category: Option<String>,
    pub sort: ProductSort,
}

impl ProductQuery {
    fn matches(&self, product: &Product, term: &str) -> bool {
        let matches_term = term.is_empty()
            || contains_folded(&product.name, term)
            || contains_folded(&product.description, term)
            || product
                .producer_name
                .as_deref()
                .is_some_and(|name| contains_folded(name, term));

        let matches_category = match self.category.as_deref() {
            None | Some(ALL_CATEGORIES) => true,
            Some(category) => product.category == category,
        };

        matches_term && matches_category
    }

    /// Filter and sort `products`, returning borrowed matches.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let term = self.term.trim().to_lowercase();
        let mut matched: Vec<&Product> = products
            .iter()
            .filter(|product| self.matches(product, &term))
            .collect();

        match self.sort {
            ProductSort::Featured => {}
            ProductSort::PriceLowToHigh => {
                matched.sort_by(|a, b| a.price.amount().cmp(&b.price.amount()));
            }
            ProductSort::PriceHighToLow => {
                matched.sort_by(|a, b| b.price.amount().cmp(&a.price.amount()));
            }
            ProductSort::Name => matched.sort_by(|a, b| compare_names(&a.name, &b.name)),
        }

        matched
    }
}

/// Search parameters for the producer directory.
#[derive(Debug, Clone, Default)]
pub struct ProducerQuery {
    /// Matched against the business name; empty matches everything.
    pub term: String,
    /// Location, or `None` / [`ALL_LOCATIONS`] for every location.
    pub location: Option<String>,
}

impl ProducerQuery {
    /// Filter `producers`, preserving backend order.
    #[must_use]
    pub fn apply<'a>(&self, producers: &'a [ProducerProfile]) -> Vec<&'a ProducerProfile> {
        let term = self.term.trim().to_lowercase();
        producers
            .iter()
            .filter(|producer| term.is_empty() || contains_folded(&producer.business_name, &term))
            .filter(|producer| match self.location.as_deref() {
                None | Some(ALL_LOCATIONS) => true,
                Some(location) => producer.location.as_deref() == Some(location),
            })
            .collect()
    }
}

/// `needle` must already be lowercase.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, name: &str, price: i64, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} from the farm"),
            price: Price::inr(Decimal::new(price, 0)).unwrap(),
            category: category.to_string(),
            images: Vec::new(),
            stock: 5,
            producer_id: Some(ProducerId::new("prod-1")),
            producer_name: Some("Green Acres".to_string()),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Turmeric", 120, "Spices"),
            product("2", "basmati rice", 300, "Organic Foods"),
            product("3", "Cotton Scarf", 80, "Textiles"),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_empty_query_keeps_backend_order() {
        let products = catalog();
        let result = ProductQuery::default().apply(&products);
        assert_eq!(ids(&result), ["1", "2", "3"]);
    }

    #[test]
    fn test_term_matches_name_description_and_producer() {
        let products = catalog();
        let by_name = ProductQuery {
            term: "TURMERIC".to_string(),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&by_name.apply(&products)), ["1"]);

        let by_producer = ProductQuery {
            term: "green acres".to_string(),
            ..ProductQuery::default()
        };
        assert_eq!(by_producer.apply(&products).len(), 3);

        let by_description = ProductQuery {
            term: "rice from".to_string(),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&by_description.apply(&products)), ["2"]);
    }

    #[test]
    fn test_category_filter_and_sentinel() {
        let products = catalog();
        let spices = ProductQuery {
            category: Some("Spices".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&spices.apply(&products)), ["1"]);

        let all = ProductQuery {
            category: Some(ALL_CATEGORIES.to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(all.apply(&products).len(), 3);
    }

    #[test]
    fn test_sorting() {
        let products = catalog();
        let sorted = |sort| {
            ids(&ProductQuery {
                sort,
                ..ProductQuery::default()
            }
            .apply(&products))
        };

        assert_eq!(sorted(ProductSort::PriceLowToHigh), ["3", "1", "2"]);
        assert_eq!(sorted(ProductSort::PriceHighToLow), ["2", "1", "3"]);
        assert_eq!(sorted(ProductSort::Name), ["2", "3", "1"]);
    }

    #[test]
    fn test_sort_param_parsing() {
        assert_eq!(
            ProductSort::from_param(Some("price-high")),
            ProductSort::PriceHighToLow
        );
        assert_eq!(ProductSort::from_param(Some("bogus")), ProductSort::Featured);
        assert_eq!(ProductSort::from_param(None), ProductSort::Featured);
    }

    #[test]
    fn test_to_cart_item_uses_first_image() {
        let mut p = product("9", "Jaggery", 60, "Organic Foods");
        assert_eq!(p.to_cart_item().image_ref, "");
        assert_eq!(p.primary_image(), PLACEHOLDER_PRODUCT_IMAGE);

        p.images = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        let line = p.to_cart_item();
        assert_eq!(line.image_ref, "a.jpg");
        assert_eq!(line.quantity, 1);
        assert_eq!(line.unit_price, p.price);
    }

    #[test]
    fn test_producer_filter() {
        let producer = |id: &str, name: &str, location: Option<&str>| ProducerProfile {
            id: ProducerId::new(id),
            business_name: name.to_string(),
            description: None,
            location: location.map(String::from),
            rating: None,
            social: SocialLinks::default(),
            profile_image: None,
            products: Vec::new(),
        };
        let producers = vec![
            producer("a", "Mumbai Weaves", Some("Mumbai")),
            producer("b", "Spice Route", Some("Chennai")),
            producer("c", "Hill Honey", None),
        ];

        let query = ProducerQuery {
            term: "spice".to_string(),
            location: None,
        };
        assert_eq!(query.apply(&producers).len(), 1);

        let query = ProducerQuery {
            term: String::new(),
            location: Some("Mumbai".to_string()),
        };
        let found = query.apply(&producers);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "a");

        let query = ProducerQuery {
            term: String::new(),
            location: Some(ALL_LOCATIONS.to_string()),
        };
        assert_eq!(query.apply(&producers).len(), 3);
    }
}
