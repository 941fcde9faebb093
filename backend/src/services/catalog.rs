//! Catalog service: item CRUD, code resolution, and free-text search
//!
//! Resolution and search are scoped to the caller's site unless the caller
//! has cross-site visibility. A failed resolution is a normal outcome, not a
//! fault: the handler layer turns it into a 404 whose payload offers item
//! creation as the recovery path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock::append_movement;
use shared::models::{generate_item_reference, CatalogItem};
use shared::search;
use shared::validation::validate_scan_code;

/// Cap on rows pulled from the store before token filtering
const SEARCH_CANDIDATE_CAP: i64 = 500;

/// Default number of search results returned to the UI
pub const DEFAULT_SEARCH_LIMIT: usize = 25;

/// Catalog service for item management and resolution
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Row mapping for catalog items
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    site_id: Uuid,
    name: String,
    reference: String,
    category: Option<String>,
    unit: String,
    quantity_on_hand: i64,
    minimum_quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for CatalogItem {
    fn from(r: ItemRow) -> Self {
        CatalogItem {
            id: r.id,
            site_id: r.site_id,
            name: r.name,
            reference: r.reference,
            category: r.category,
            unit: r.unit,
            quantity_on_hand: r.quantity_on_hand,
            minimum_quantity: r.minimum_quantity,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, site_id, name, reference, category, unit, quantity_on_hand, \
                            minimum_quantity, created_at, updated_at";

/// Input for creating a catalog item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    /// Scanned or hand-assigned reference; a system reference is generated
    /// when omitted
    pub reference: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub initial_quantity: Option<i64>,
    pub minimum_quantity: Option<i64>,
}

/// Input for updating a catalog item. Quantity is absent on purpose: stock
/// only moves through the ledger.
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub minimum_quantity: Option<i64>,
}

/// Result of resolving a code
#[derive(Debug, Serialize)]
pub struct ResolveOutcome {
    pub item: CatalogItem,
    /// True when the match was on the reference rather than the name
    pub matched_on_reference: bool,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a catalog item. When no reference is supplied a system
    /// reference (`STK-` prefix) is assigned, which ranks the item below
    /// scanned references in search results. A non-zero initial quantity is
    /// recorded through the ledger like any other stock change.
    pub async fn create_item(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        input: CreateItemInput,
    ) -> AppResult<CatalogItem> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Item name cannot be empty".to_string(),
                message_fr: "Le nom de l'article ne peut pas être vide".to_string(),
            });
        }

        let initial_quantity = input.initial_quantity.unwrap_or(0);
        if initial_quantity < 0 {
            return Err(AppError::Validation {
                field: "initial_quantity".to_string(),
                message: "Initial quantity cannot be negative".to_string(),
                message_fr: "La quantité initiale ne peut pas être négative".to_string(),
            });
        }

        let reference = match input.reference {
            Some(reference) => {
                let reference = reference.trim().to_string();
                validate_scan_code(&reference).map_err(|msg| AppError::Validation {
                    field: "reference".to_string(),
                    message: msg.to_string(),
                    message_fr: "Référence invalide".to_string(),
                })?;
                reference
            }
            None => {
                let sequence = sqlx::query_scalar::<_, i64>(
                    "SELECT nextval('catalog_reference_seq')",
                )
                .fetch_one(&self.db)
                .await?;
                generate_item_reference(sequence)
            }
        };

        // Reference must be unique within the site
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog_items WHERE site_id = $1 AND LOWER(reference) = LOWER($2)",
        )
        .bind(site_id)
        .bind(&reference)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("reference".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let result = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO catalog_items (site_id, name, reference, category, unit, quantity_on_hand, minimum_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(site_id)
        .bind(input.name.trim())
        .bind(&reference)
        .bind(&input.category)
        .bind(input.unit.unwrap_or_else(|| "pièce".to_string()))
        .bind(initial_quantity)
        .bind(input.minimum_quantity.unwrap_or(0))
        .fetch_one(&mut *tx)
        .await;

        let row = match result {
            Ok(row) => row,
            // Concurrent creation with the same reference loses to the
            // unique index
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                return Err(AppError::DuplicateEntry("reference".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        // The genesis stock is a ledger entry like any other
        if initial_quantity > 0 {
            append_movement(
                &mut tx,
                row.id,
                site_id,
                user_id,
                initial_quantity,
                "initial stock at item creation",
                None,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get a catalog item by id within the caller's visibility
    pub async fn get_item(
        &self,
        site_id: Uuid,
        cross_site: bool,
        item_id: Uuid,
    ) -> AppResult<CatalogItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM catalog_items
            WHERE id = $1 AND ($2 OR site_id = $3)
            "#,
        ))
        .bind(item_id)
        .bind(cross_site)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Catalog item".to_string()))?;

        Ok(row.into())
    }

    /// Update item metadata (never the quantity)
    pub async fn update_item(
        &self,
        site_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<CatalogItem> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE catalog_items
            SET name = COALESCE($1, name),
                category = COALESCE($2, category),
                unit = COALESCE($3, unit),
                minimum_quantity = COALESCE($4, minimum_quantity),
                updated_at = NOW()
            WHERE id = $5 AND site_id = $6
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.minimum_quantity)
        .bind(item_id)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Catalog item".to_string()))?;

        Ok(row.into())
    }

    /// List items for a site, name order
    pub async fn list_items(
        &self,
        site_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<CatalogItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM catalog_items
            WHERE site_id = $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(site_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Resolve a confirmed or manually entered code to a catalog item.
    ///
    /// An item whose reference or name equals the code (case-insensitively)
    /// wins outright; reference matches rank above name matches. `Ok(None)`
    /// means no match — an expected outcome.
    pub async fn resolve(
        &self,
        site_id: Uuid,
        cross_site: bool,
        code: &str,
    ) -> AppResult<Option<ResolveOutcome>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM catalog_items
            WHERE (LOWER(reference) = LOWER($1) OR LOWER(name) = LOWER($1))
              AND ($2 OR site_id = $3)
            ORDER BY (LOWER(reference) = LOWER($1)) DESC, updated_at DESC
            LIMIT 1
            "#,
        ))
        .bind(code)
        .bind(cross_site)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| {
            let matched_on_reference = r.reference.eq_ignore_ascii_case(code);
            ResolveOutcome {
                item: r.into(),
                matched_on_reference,
            }
        }))
    }

    /// Free-text search, re-run per keystroke.
    ///
    /// The store prefilters on the first token; full AND-semantics matching
    /// and ranking run in process via `shared::search` (the same code the
    /// browser applies to its cached list).
    pub async fn search(
        &self,
        site_id: Uuid,
        cross_site: bool,
        query: &str,
        limit: usize,
    ) -> AppResult<Vec<CatalogItem>> {
        let tokens = search::tokenize(query);
        let first = match tokens.first() {
            Some(t) => t.clone(),
            None => return Ok(Vec::new()),
        };
        let pattern = format!("%{}%", first);

        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM catalog_items
            WHERE (name ILIKE $1 OR reference ILIKE $1 OR category ILIKE $1)
              AND ($2 OR site_id = $3)
            LIMIT $4
            "#,
        ))
        .bind(&pattern)
        .bind(cross_site)
        .bind(site_id)
        .bind(SEARCH_CANDIDATE_CAP)
        .fetch_all(&self.db)
        .await?;

        let items: Vec<CatalogItem> = rows.into_iter().map(Into::into).collect();
        let mut matched = search::search_items(&items, query);
        matched.truncate(limit);
        Ok(matched)
    }

    /// Delete an item. Fails once movements reference it (the audit trail
    /// keeps history immutable), surfacing the database restriction.
    pub async fn delete_item(&self, site_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM catalog_items WHERE id = $1 AND site_id = $2")
            .bind(item_id)
            .bind(site_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Catalog item".to_string()));
        }

        Ok(())
    }
}
