//! Container ("box") and container line models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a container. `open → closed` is one-way; there is no
/// re-open operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Open,
    Closed,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Open => "open",
            ContainerStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ContainerStatus::Open),
            "closed" => Some(ContainerStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical shipping box being packed within a preparation.
///
/// The human-assigned identifier is unique within its preparation,
/// case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: Uuid,
    pub preparation_id: Uuid,
    pub identifier: String,
    pub status: ContainerStatus,
    /// Weight recorded when the sealed box is put on the scale
    pub weight_kg: Option<Decimal>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Container {
    pub fn is_open(&self) -> bool {
        self.status == ContainerStatus::Open
    }
}

/// One item-and-quantity entry inside a container.
///
/// Name and reference are denormalized from the catalog item at first pack
/// so the packing record survives later catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerLine {
    pub id: Uuid,
    pub container_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_reference: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// On-demand aggregate over a container's lines; never cached as a source
/// of truth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerTotals {
    pub line_count: i64,
    pub total_quantity: i64,
}
