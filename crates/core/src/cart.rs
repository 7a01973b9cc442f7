//! Client-side shopping cart.
//!
//! The cart is a mapping from [`ProductId`] to [`CartItem`] that remembers
//! first-add order for display. Every transition is a total, synchronous
//! function of the current state and its inputs: nothing here can fail and
//! nothing here performs I/O.
//!
//! Quantities may reach zero through [`Cart::update_quantity`]; such rows are
//! kept until [`Cart::remove_item`] is called.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique key within a cart.
    pub product_id: ProductId,
    /// Product name at the time it was added.
    pub name: String,
    /// Price of a single unit.
    pub unit_price: Price,
    /// Number of units. Zero means "removed" for display purposes.
    pub quantity: u32,
    /// Image URL shown next to the line.
    pub image_ref: String,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An ordered collection of cart lines keyed by product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add one unit of a product.
    ///
    /// If the product is already in the cart its quantity goes up by exactly
    /// one and the incoming item is otherwise ignored. Otherwise the item is
    /// appended with its quantity forced to 1.
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.find_mut(&item.product_id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }
        self.items.push(CartItem { quantity: 1, ..item });
    }

    /// Remove a product's line. Does nothing if the product is not present.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.items.retain(|item| &item.product_id != product_id);
    }

    /// Set a line's quantity, clamping negative input to zero.
    ///
    /// A line set to zero stays in the cart. Does nothing if the product is
    /// not present.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if let Some(existing) = self.find_mut(product_id) {
            existing.quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `unit_price * quantity` over all lines, computed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Lines in first-add order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by product.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
    }

    /// Number of distinct lines (including zero-quantity lines).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    fn find_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
    }
}
