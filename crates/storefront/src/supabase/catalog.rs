//! Product and producer reads from PostgREST.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use tracing::{debug, instrument};

use twin_gain_core::catalog::{ProducerProfile, Product};
use twin_gain_core::{ProducerId, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::types::{ProductRow, ProfileRow, convert_products};
use super::{BackendError, SupabaseHttp};

const PRODUCTS_SELECT: &str = "*,producer:producer_id(business_name)";
const PRODUCERS_SELECT: &str = "*,products(*)";

/// Client for the catalog tables.
///
/// Whole lists are fetched and cached; single-item lookups are served from
/// the cached list.
#[derive(Clone)]
pub struct CatalogClient {
    http: SupabaseHttp,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client whose lists live for `ttl`.
    #[must_use]
    fn new(http: SupabaseHttp, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { http, cache }
    }

    /// Create a catalog client from configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::StorefrontConfig) -> Self {
        Self::new(
            SupabaseHttp::new(&config.supabase),
            config.catalog_cache_ttl,
        )
    }

    /// All products, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request or response parsing fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.http.endpoint("rest/v1/products")?;
        url.query_pairs_mut().append_pair("select", PRODUCTS_SELECT);

        let rows: Vec<ProductRow> = self
            .http
            .execute(self.http.request(Method::GET, url, None))
            .await?;
        let products = Arc::new(convert_products(rows, None));
        debug!(count = products.len(), "Fetched products");

        self.cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// A single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no product has this ID.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, BackendError> {
        self.products()
            .await?
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("product {id}")))
    }

    /// All producer profiles with their products.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request or response parsing fails.
    #[instrument(skip(self))]
    pub async fn producers(&self) -> Result<Arc<Vec<ProducerProfile>>, BackendError> {
        if let Some(CacheValue::Producers(producers)) = self.cache.get(&CacheKey::Producers).await
        {
            debug!("Cache hit for producers");
            return Ok(producers);
        }

        let mut url = self.http.endpoint("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("select", PRODUCERS_SELECT)
            .append_pair("type", "eq.producer");

        let rows: Vec<ProfileRow> = self
            .http
            .execute(self.http.request(Method::GET, url, None))
            .await?;
        let producers: Arc<Vec<ProducerProfile>> =
            Arc::new(rows.into_iter().map(ProfileRow::into_profile).collect());
        debug!(count = producers.len(), "Fetched producers");

        self.cache
            .insert(
                CacheKey::Producers,
                CacheValue::Producers(Arc::clone(&producers)),
            )
            .await;
        Ok(producers)
    }

    /// A single producer profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no producer has this ID.
    #[instrument(skip(self))]
    pub async fn producer(&self, id: &ProducerId) -> Result<ProducerProfile, BackendError> {
        self.producers()
            .await?
            .iter()
            .find(|producer| &producer.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("producer {id}")))
    }

    /// Products listed by one producer, in backend order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the product list cannot be fetched.
    pub async fn products_by_producer(
        &self,
        id: &ProducerId,
    ) -> Result<Vec<Product>, BackendError> {
        Ok(self
            .products()
            .await?
            .iter()
            .filter(|product| product.producer_id.as_ref() == Some(id))
            .cloned()
            .collect())
    }
}
