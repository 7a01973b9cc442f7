//! Wire types for Supabase responses and their conversion to domain types.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use twin_gain_core::catalog::{ProducerProfile, Product, SocialLinks};
use twin_gain_core::{Email, Identity, Price, PriceError, ProducerId, ProductId, Role, UserId};

// =============================================================================
// Auth
// =============================================================================

/// User metadata set at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    /// Account role tag (`producer` or `consumer`).
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A GoTrue user object.
#[derive(Debug, Clone, Deserialize)]
pub struct GoTrueUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl GoTrueUser {
    /// The role tag, if present and recognised.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user_metadata.kind.as_deref()?.parse().ok()
    }

    /// Convert to an [`Identity`]. Users without a role tag have none.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        let role = self.role()?;
        let email = self.email.as_deref().and_then(|e| Email::parse(e).ok());
        Some(Identity::new(UserId::new(self.id.as_str()), email, role))
    }
}

/// Response of the token endpoint (password and refresh grants).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Absolute expiry as a Unix timestamp, sent by newer GoTrue versions.
    pub expires_at: Option<i64>,
    pub user: GoTrueUser,
}

impl TokenResponse {
    /// Split into stored tokens and the user.
    #[must_use]
    pub fn into_parts(self, now: DateTime<Utc>) -> (AuthTokens, GoTrueUser) {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in));
        (
            AuthTokens {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at,
            },
            self.user,
        )
    }
}

/// Sign-up returns a session when email confirmation is disabled and the bare
/// user otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(GoTrueUser),
}

/// Tokens kept in the cookie session so a client survives an idle eviction.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    /// Whether the access token is expired, with a small leeway.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(30) <= now
    }
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Embedded producer on a product row.
#[derive(Debug, Clone, Deserialize)]
pub struct ProducerRef {
    pub business_name: Option<String>,
}

/// A row of the `products` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i64>,
    pub producer_id: Option<String>,
    pub producer: Option<ProducerRef>,
}

impl ProductRow {
    /// Convert to a [`Product`], using `producer_name` when the row has no
    /// embedded producer.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the row carries a negative price.
    pub fn into_product(self, producer_name: Option<&str>) -> Result<Product, PriceError> {
        let price = Price::inr(self.price)?;
        let stock = u32::try_from(self.stock.unwrap_or(0).max(0)).unwrap_or(u32::MAX);
        let producer_name = self
            .producer
            .and_then(|p| p.business_name)
            .or_else(|| producer_name.map(String::from));

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description.unwrap_or_default(),
            price,
            category: self.category.unwrap_or_default(),
            images: self.images.unwrap_or_default(),
            stock,
            producer_id: self.producer_id.map(ProducerId::new),
            producer_name,
        })
    }
}

/// Social media links as stored on a profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialMediaRow {
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
}

/// A row of the `profiles` table with products embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f32>,
    pub social_media: Option<SocialMediaRow>,
    pub profile_image: Option<String>,
    pub products: Option<Vec<ProductRow>>,
}

impl ProfileRow {
    /// Convert to a [`ProducerProfile`].
    #[must_use]
    pub fn into_profile(self) -> ProducerProfile {
        let business_name = self.business_name.unwrap_or_default();
        let products = convert_products(self.products.unwrap_or_default(), Some(&business_name))
            .into_iter()
            .map(|mut product| {
                product
                    .producer_id
                    .get_or_insert_with(|| ProducerId::new(self.id.as_str()));
                product
            })
            .collect();
        let social = self.social_media.unwrap_or_default();

        ProducerProfile {
            id: ProducerId::new(self.id),
            business_name,
            description: self.description,
            location: self.location,
            rating: self.rating,
            social: SocialLinks {
                facebook: social.facebook,
                instagram: social.instagram,
                twitter: social.twitter,
            },
            profile_image: self.profile_image,
            products,
        }
    }
}

/// Convert product rows, skipping rows that cannot be represented.
#[must_use]
pub fn convert_products(rows: Vec<ProductRow>, producer_name: Option<&str>) -> Vec<Product> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match row.into_product(producer_name) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(product_id = %id, error = %e, "Skipping product row");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_user_identity_requires_role() {
        let user: GoTrueUser = serde_json::from_str(
            r#"{"id":"u1","email":"Ann@Example.COM","user_metadata":{"type":"producer"}}"#,
        )
        .unwrap();
        let identity = user.identity().unwrap();
        assert_eq!(identity.role, Role::Producer);
        assert_eq!(identity.email.unwrap().as_str(), "Ann@example.com");

        let untagged: GoTrueUser = serde_json::from_str(r#"{"id":"u2","email":null}"#).unwrap();
        assert!(untagged.identity().is_none());

        let unknown: GoTrueUser =
            serde_json::from_str(r#"{"id":"u3","user_metadata":{"type":"admin"}}"#).unwrap();
        assert!(unknown.identity().is_none());
    }

    #[test]
    fn test_token_expiry_from_lifetime() {
        let now = Utc::now();
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"user":{"id":"u1"}}"#,
        )
        .unwrap();
        let (tokens, user) = response.into_parts(now);
        assert_eq!(tokens.expires_at, now + Duration::seconds(3600));
        assert_eq!(user.id, "u1");
        assert!(!tokens.is_expired(now));
        assert!(tokens.is_expired(now + Duration::seconds(3590)));
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let session: SignUpResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":60,"user":{"id":"u1"}}"#,
        )
        .unwrap();
        assert!(matches!(session, SignUpResponse::Session(_)));

        let user: SignUpResponse =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.co","user_metadata":{}}"#).unwrap();
        assert!(matches!(user, SignUpResponse::User(_)));
    }

    #[test]
    fn test_tokens_debug_redacts() {
        let tokens = AuthTokens {
            access_token: "secret-access".to_string(),
            refresh_token: "secret-refresh".to_string(),
            expires_at: Utc::now(),
        };
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn test_product_row_conversion() {
        let rows: Vec<ProductRow> = serde_json::from_str(
            r#"[
                {"id":"p1","name":"Turmeric","price":120.5,"stock":-3,
                 "producer_id":"pr1","producer":{"business_name":"Spice Route"}},
                {"id":"p2","name":"Broken","price":-1},
                {"id":"p3","name":"Scarf","price":"80","images":["a.jpg"],"stock":4}
            ]"#,
        )
        .unwrap();

        let products = convert_products(rows, Some("Fallback"));
        assert_eq!(products.len(), 2);

        assert_eq!(products[0].stock, 0);
        assert_eq!(products[0].producer_name.as_deref(), Some("Spice Route"));
        assert_eq!(products[0].price.amount(), Decimal::new(1205, 1));

        assert_eq!(products[1].producer_name.as_deref(), Some("Fallback"));
        assert_eq!(products[1].images, ["a.jpg"]);
        assert!(products[1].in_stock());
    }

    #[test]
    fn test_profile_row_conversion() {
        let row: ProfileRow = serde_json::from_str(
            r#"{"id":"pr1","business_name":"Hill Honey","location":"Mumbai","rating":4.5,
                "social_media":{"instagram":"@hillhoney"},
                "products":[{"id":"p1","name":"Honey","price":250,"stock":2}]}"#,
        )
        .unwrap();

        let profile = row.into_profile();
        assert_eq!(profile.business_name, "Hill Honey");
        assert_eq!(profile.social.instagram.as_deref(), Some("@hillhoney"));
        assert_eq!(profile.products.len(), 1);
        assert_eq!(
            profile.products[0].producer_id.as_ref().unwrap().as_str(),
            "pr1"
        );
        assert_eq!(
            profile.products[0].producer_name.as_deref(),
            Some("Hill Honey")
        );
    }
}
