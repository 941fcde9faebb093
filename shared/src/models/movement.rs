//! Stock movement model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable audit record of one stock quantity change.
///
/// Movements are append-only: they are never edited or deleted, and summing
/// deltas over a time range reconstructs the net change for an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub site_id: Uuid,
    pub user_id: Uuid,
    /// Signed quantity delta; negative for stock leaving the shelf
    pub delta: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Well-known movement reasons written by the packing coordinator
pub mod reasons {
    pub const PACKED: &str = "packed into container";
    pub const UNPACKED: &str = "removed from container";
}
