//! Site (operating base) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operating base. Catalog items and users belong to exactly one site;
/// preparations ship between two of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    /// Short code used in references and shipment names (e.g. "NDJ")
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
