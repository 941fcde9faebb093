//! Stock ledger service
//!
//! The single entry point for on-hand quantity changes. Every adjustment is
//! one transaction: a conditional update that refuses to take the quantity
//! negative, plus exactly one appended movement. Movements are never edited
//! or deleted; `quantity_on_hand` on the item stays the authoritative read.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{is_transient, MAX_TX_ATTEMPTS};
use shared::models::{CatalogItem, Movement};
use shared::types::DateRange;

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Row mapping for movements
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    item_id: Uuid,
    site_id: Uuid,
    user_id: Uuid,
    delta: i64,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for Movement {
    fn from(r: MovementRow) -> Self {
        Movement {
            id: r.id,
            item_id: r.item_id,
            site_id: r.site_id,
            user_id: r.user_id,
            delta: r.delta,
            reason: r.reason,
            created_at: r.created_at,
        }
    }
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub item_id: Uuid,
    pub delta: i64,
    pub reason: String,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Adjust the on-hand quantity of an item and append the movement.
    ///
    /// Returns the new quantity. A delta that would take the quantity
    /// negative aborts the whole adjustment with `InsufficientStock` and
    /// writes nothing. Serialization conflicts are retried a bounded number
    /// of times.
    pub async fn adjust(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        input: &AdjustStockInput,
    ) -> AppResult<i64> {
        if input.delta == 0 {
            return Err(AppError::Validation {
                field: "delta".to_string(),
                message: "Delta cannot be zero".to_string(),
                message_fr: "Le delta ne peut pas être nul".to_string(),
            });
        }
        if input.reason.trim().is_empty() {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: "A reason is required for every stock adjustment".to_string(),
                message_fr: "Un motif est requis pour tout ajustement de stock".to_string(),
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_adjust(site_id, user_id, input).await {
                Err(e) if is_transient(&e) && attempt < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Retrying stock adjustment after conflict (attempt {})", attempt);
                    continue;
                }
                other => return other,
            }
        }
    }

    async fn try_adjust(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        input: &AdjustStockInput,
    ) -> AppResult<i64> {
        let mut tx = self.db.begin().await?;

        let new_quantity = apply_stock_delta(&mut tx, site_id, input.item_id, input.delta).await?;

        append_movement(
            &mut tx,
            input.item_id,
            site_id,
            user_id,
            input.delta,
            input.reason.trim(),
            None,
        )
        .await?;

        tx.commit().await?;

        Ok(new_quantity)
    }

    /// Movements for an item, newest first, optionally bounded by a date
    /// range
    pub async fn list_movements(
        &self,
        site_id: Uuid,
        item_id: Uuid,
        range: Option<&DateRange>,
    ) -> AppResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, item_id, site_id, user_id, delta, reason, created_at
            FROM movements
            WHERE item_id = $1 AND site_id = $2
              AND ($3::date IS NULL OR created_at >= $3::date)
              AND ($4::date IS NULL OR created_at < $4::date + INTERVAL '1 day')
            ORDER BY created_at DESC
            "#,
        )
        .bind(item_id)
        .bind(site_id)
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Net quantity change for an item over a date range, reconstructed from
    /// the movement log
    pub async fn net_change(
        &self,
        site_id: Uuid,
        item_id: Uuid,
        range: &DateRange,
    ) -> AppResult<i64> {
        let net = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(delta), 0)::BIGINT
            FROM movements
            WHERE item_id = $1 AND site_id = $2
              AND created_at >= $3::date
              AND created_at < $4::date + INTERVAL '1 day'
            "#,
        )
        .bind(item_id)
        .bind(site_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        Ok(net)
    }

    /// Items whose on-hand quantity sits at or below their restock threshold
    pub async fn below_minimum(&self, site_id: Uuid) -> AppResult<Vec<CatalogItem>> {
        #[derive(FromRow)]
        struct Row {
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

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT id, site_id, name, reference, category, unit, quantity_on_hand,
                   minimum_quantity, created_at, updated_at
            FROM catalog_items
            WHERE site_id = $1 AND quantity_on_hand <= minimum_quantity
            ORDER BY quantity_on_hand - minimum_quantity
            "#,
        )
        .bind(site_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CatalogItem {
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
            })
            .collect())
    }
}

/// Apply a signed delta to an item's on-hand quantity with the
/// non-negativity guard pushed into the store. Returns the new quantity.
///
/// The UPDATE is conditional, so two sessions racing on the same item can
/// never both consume the last units: the losing update matches zero rows.
pub(crate) async fn apply_stock_delta(
    tx: &mut Transaction<'_, Postgres>,
    site_id: Uuid,
    item_id: Uuid,
    delta: i64,
) -> AppResult<i64> {
    let updated = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE catalog_items
        SET quantity_on_hand = quantity_on_hand + $1, updated_at = NOW()
        WHERE id = $2 AND site_id = $3 AND quantity_on_hand + $1 >= 0
        RETURNING quantity_on_hand
        "#,
    )
    .bind(delta)
    .bind(item_id)
    .bind(site_id)
    .fetch_optional(&mut **tx)
    .await?;

    match updated {
        Some(quantity) => Ok(quantity),
        None => {
            // Distinguish a missing item from an insufficient balance
            let current = sqlx::query_as::<_, (String, i64)>(
                "SELECT name, quantity_on_hand FROM catalog_items WHERE id = $1 AND site_id = $2",
            )
            .bind(item_id)
            .bind(site_id)
            .fetch_optional(&mut **tx)
            .await?;

            match current {
                Some((name, available)) => Err(AppError::InsufficientStock {
                    item: name,
                    requested: -delta,
                    available,
                }),
                None => Err(AppError::NotFound("Catalog item".to_string())),
            }
        }
    }
}

/// Append one immutable movement row
pub(crate) async fn append_movement(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
    site_id: Uuid,
    user_id: Uuid,
    delta: i64,
    reason: &str,
    idempotency_key: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO movements (item_id, site_id, user_id, delta, reason, idempotency_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(item_id)
    .bind(site_id)
    .bind(user_id)
    .bind(delta)
    .bind(reason)
    .bind(idempotency_key)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
