//! Catalog item model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item held in stock at one site.
///
/// `quantity_on_hand` is the authoritative on-hand figure; it is mutated
/// exclusively through the stock ledger and never reconstructed from
/// movements in the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub site_id: Uuid,
    pub name: String,
    /// External reference code; system-generated references carry the
    /// `STK-` prefix, scanned ones do not
    pub reference: String,
    pub category: Option<String>,
    /// Unit of measure (e.g. "pièce", "litre")
    pub unit: String,
    pub quantity_on_hand: i64,
    /// Restock alert threshold
    pub minimum_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    /// True when on-hand stock is at or below the restock threshold
    pub fn is_below_minimum(&self) -> bool {
        self.quantity_on_hand <= self.minimum_quantity
    }
}

/// Generate a system-assigned reference for an item created without a
/// scanned code
pub fn generate_item_reference(sequence: i64) -> String {
    format!("{}{:06}", crate::validation::GENERATED_REFERENCE_PREFIX, sequence)
}
