//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Language;

/// Permission granting visibility over every site's catalog instead of only
/// the user's own
pub const PERM_CATALOG_CROSS_SITE: &str = "catalog:cross_site";

/// An operator account, scoped to one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub site_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub permissions: Vec<String>,
    pub preferred_language: Language,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
