//! Shipment preparation model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Groups the containers of one shipment between two sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preparation {
    pub id: Uuid,
    /// Origin site; packed stock is drawn from this site's catalog
    pub site_id: Uuid,
    pub destination_site_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived counters over a preparation's containers. Computed on demand;
/// the authoritative state is the containers and their lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationSummary {
    pub container_count: i64,
    pub closed_container_count: i64,
    pub total_quantity: i64,
    /// Sum of recorded weights of closed containers
    pub total_weight_kg: Option<Decimal>,
}
