//! Cache types for catalog responses.

use std::sync::Arc;

use twin_gain_core::catalog::{ProducerProfile, Product};

/// Cache key for catalog lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Producers,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Producers(Arc<Vec<ProducerProfile>>),
}
