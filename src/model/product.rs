use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a [`Product`], generated by the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        ProductId(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a product in the catalog.
///
/// # Resource Domain
/// This struct implements the [`DomainEntity`](crate::framework::DomainEntity) and
/// [`SoftDeletable`](crate::framework::SoftDeletable) traits: deleting it softly
/// only stamps `deleted_at`, and undeleting clears it again.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Creates a new, not yet persisted Product.
    ///
    /// # Arguments
    /// * `name` - Product name
    /// * `price` - Product price
    /// * `quantity` - Available stock quantity
    pub fn new(name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            quantity,
            deleted_at: None,
        }
    }
}
