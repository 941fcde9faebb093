//! Packing coordinator service
//!
//! Orchestrates the container-content mutations and their paired stock
//! ledger entries. Every operation here is one SQL transaction: the line
//! change, the conditional stock update, and the appended movement commit
//! together or not at all, which is what keeps the conservation law intact
//! under concurrent sessions and partial failures.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::container::LINE_COLUMNS;
use crate::services::stock::{append_movement, apply_stock_delta};
use crate::services::{is_transient, MAX_TX_ATTEMPTS};
use shared::models::{reasons, ContainerLine, ContainerStatus};
use shared::validation::validate_quantity;

/// Width of the time bucket folded into derived idempotency keys. Two
/// accidental submissions of one confirmed scan land in the same bucket;
/// deliberately packing the same item again minutes later does not.
pub const IDEMPOTENCY_BUCKET_SECS: i64 = 10;

/// Packing coordinator service
#[derive(Clone)]
pub struct PackingService {
    db: PgPool,
}

/// Input for packing an item into a container
#[derive(Debug, Deserialize)]
pub struct PackInput {
    pub item_id: Uuid,
    pub quantity: i64,
    /// Confirmed code that triggered this pack; used to derive an
    /// idempotency key when none is supplied explicitly
    pub confirmed_code: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Result of a pack call
#[derive(Debug, Serialize)]
pub struct PackOutcome {
    pub line: ContainerLine,
    /// False when the idempotency key matched an earlier application and
    /// nothing was changed
    pub applied: bool,
}

/// Result of an unpack or set-quantity call
#[derive(Debug, Serialize)]
pub struct LineChangeOutcome {
    /// Signed stock delta that was applied (positive = restored to shelf)
    pub stock_delta: i64,
    /// The surviving line, or None when it was removed entirely
    pub line: Option<ContainerLine>,
}

/// Line joined with its container's state, locked for the duration of the
/// transaction
#[derive(Debug, FromRow)]
struct LockedLineRow {
    id: Uuid,
    container_id: Uuid,
    item_id: Uuid,
    item_name: String,
    item_reference: String,
    quantity: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    container_identifier: String,
    container_status: String,
}

impl LockedLineRow {
    fn into_line(self) -> ContainerLine {
        ContainerLine {
            id: self.id,
            container_id: self.container_id,
            item_id: self.item_id,
            item_name: self.item_name,
            item_reference: self.item_reference,
            quantity: self.quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl PackingService {
    /// Create a new PackingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Pack a quantity of an item into an open container.
    ///
    /// The container line increase, the conditional stock decrement, and the
    /// `-quantity` movement are one transaction; `InsufficientStock` and
    /// `ContainerClosed` leave both the container and the stock untouched.
    pub async fn pack(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        container_id: Uuid,
        input: &PackInput,
    ) -> AppResult<PackOutcome> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_fr: "La quantité doit être d'au moins 1".to_string(),
        })?;

        let idempotency_key = match (&input.idempotency_key, &input.confirmed_code) {
            (Some(key), _) => Some(key.clone()),
            (None, Some(code)) => {
                let bucket = chrono::Utc::now().timestamp() / IDEMPOTENCY_BUCKET_SECS;
                Some(derive_idempotency_key(code, container_id, bucket))
            }
            (None, None) => None,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .try_pack(site_id, user_id, container_id, input, idempotency_key.as_deref())
                .await
            {
                Err(e) if is_transient(&e) && attempt < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Retrying pack after conflict (attempt {})", attempt);
                    continue;
                }
                other => return other,
            }
        }
    }

    async fn try_pack(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        container_id: Uuid,
        input: &PackInput,
        idempotency_key: Option<&str>,
    ) -> AppResult<PackOutcome> {
        let mut tx = self.db.begin().await?;

        let container = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT c.identifier, c.status
            FROM containers c
            JOIN preparations p ON p.id = c.preparation_id
            WHERE c.id = $1 AND p.site_id = $2
            "#,
        )
        .bind(container_id)
        .bind(site_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Container".to_string()))?;

        let (identifier, status) = container;
        if ContainerStatus::parse(&status) != Some(ContainerStatus::Open) {
            return Err(AppError::ContainerClosed { identifier });
        }

        // A repeated idempotency key means a caller double-fired one
        // confirmed scan: report the line as it stands, change nothing
        if let Some(key) = idempotency_key {
            let seen = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM movements WHERE idempotency_key = $1)",
            )
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;

            if seen {
                let line = sqlx::query_as::<_, crate::services::container::LineRow>(&format!(
                    r#"
                    SELECT {LINE_COLUMNS}
                    FROM container_lines
                    WHERE container_id = $1 AND item_id = $2
                    "#,
                ))
                .bind(container_id)
                .bind(input.item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::DuplicateEntry("idempotency key".to_string()))?;

                return Ok(PackOutcome {
                    line: line.into(),
                    applied: false,
                });
            }
        }

        // Conditional decrement: the store enforces sufficiency, so two
        // sessions cannot both consume the last units
        apply_stock_delta(&mut tx, site_id, input.item_id, -input.quantity).await?;

        // Denormalize the item's current name and reference into the line
        let (item_name, item_reference) = sqlx::query_as::<_, (String, String)>(
            "SELECT name, reference FROM catalog_items WHERE id = $1",
        )
        .bind(input.item_id)
        .fetch_one(&mut *tx)
        .await?;

        let line = sqlx::query_as::<_, crate::services::container::LineRow>(&format!(
            r#"
            INSERT INTO container_lines (container_id, item_id, item_name, item_reference, quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (container_id, item_id)
            DO UPDATE SET quantity = container_lines.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING {LINE_COLUMNS}
            "#,
        ))
        .bind(container_id)
        .bind(input.item_id)
        .bind(&item_name)
        .bind(&item_reference)
        .bind(input.quantity)
        .fetch_one(&mut *tx)
        .await?;

        append_movement(
            &mut tx,
            input.item_id,
            site_id,
            user_id,
            -input.quantity,
            &format!("{} {}", reasons::PACKED, identifier),
            idempotency_key,
        )
        .await?;

        tx.commit().await?;

        Ok(PackOutcome {
            line: line.into(),
            applied: true,
        })
    }

    /// Remove a quantity from a line, restoring it to stock. Removing the
    /// full line quantity deletes the line.
    pub async fn unpack(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        line_id: Uuid,
        quantity_to_remove: i64,
    ) -> AppResult<LineChangeOutcome> {
        validate_quantity(quantity_to_remove).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_fr: "La quantité doit être d'au moins 1".to_string(),
        })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .try_unpack(site_id, user_id, line_id, quantity_to_remove)
                .await
            {
                Err(e) if is_transient(&e) && attempt < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Retrying unpack after conflict (attempt {})", attempt);
                    continue;
                }
                other => return other,
            }
        }
    }

    async fn try_unpack(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        line_id: Uuid,
        quantity_to_remove: i64,
    ) -> AppResult<LineChangeOutcome> {
        let mut tx = self.db.begin().await?;

        let locked = self.lock_line(&mut tx, site_id, line_id).await?;

        if ContainerStatus::parse(&locked.container_status) != Some(ContainerStatus::Open) {
            return Err(AppError::ContainerClosed {
                identifier: locked.container_identifier,
            });
        }

        if quantity_to_remove > locked.quantity {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: format!(
                    "Cannot remove {} from a line holding {}",
                    quantity_to_remove, locked.quantity
                ),
                message_fr: format!(
                    "Impossible de retirer {} d'une ligne qui en contient {}",
                    quantity_to_remove, locked.quantity
                ),
            });
        }

        let outcome = self
            .shrink_line(&mut tx, site_id, user_id, &locked, quantity_to_remove)
            .await?;

        tx.commit().await?;

        Ok(outcome)
    }

    /// Set a line to an absolute quantity: the signed combination of pack
    /// and unpack for the delta, including the stock-sufficiency check when
    /// the delta is positive. Zero removes the line entirely.
    pub async fn set_quantity(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        line_id: Uuid,
        new_quantity: i64,
    ) -> AppResult<LineChangeOutcome> {
        if new_quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity cannot be negative".to_string(),
                message_fr: "La quantité ne peut pas être négative".to_string(),
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .try_set_quantity(site_id, user_id, line_id, new_quantity)
                .await
            {
                Err(e) if is_transient(&e) && attempt < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Retrying set-quantity after conflict (attempt {})", attempt);
                    continue;
                }
                other => return other,
            }
        }
    }

    async fn try_set_quantity(
        &self,
        site_id: Uuid,
        user_id: Uuid,
        line_id: Uuid,
        new_quantity: i64,
    ) -> AppResult<LineChangeOutcome> {
        let mut tx = self.db.begin().await?;

        let locked = self.lock_line(&mut tx, site_id, line_id).await?;

        if ContainerStatus::parse(&locked.container_status) != Some(ContainerStatus::Open) {
            return Err(AppError::ContainerClosed {
                identifier: locked.container_identifier,
            });
        }

        let delta = new_quantity - locked.quantity;

        if delta == 0 {
            return Ok(LineChangeOutcome {
                stock_delta: 0,
                line: Some(locked.into_line()),
            });
        }

        if delta < 0 {
            // Shrinking: restore the difference to stock
            let outcome = self
                .shrink_line(&mut tx, site_id, user_id, &locked, -delta)
                .await?;
            tx.commit().await?;
            return Ok(outcome);
        }

        // Growing: same sufficiency rule as a fresh pack
        apply_stock_delta(&mut tx, site_id, locked.item_id, -delta).await?;

        let line = sqlx::query_as::<_, crate::services::container::LineRow>(&format!(
            r#"
            UPDATE container_lines
            SET quantity = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {LINE_COLUMNS}
            "#,
        ))
        .bind(new_quantity)
        .bind(line_id)
        .fetch_one(&mut *tx)
        .await?;

        append_movement(
            &mut tx,
            locked.item_id,
            site_id,
            user_id,
            -delta,
            &format!("{} {}", reasons::PACKED, locked.container_identifier),
            None,
        )
        .await?;

        tx.commit().await?;

        Ok(LineChangeOutcome {
            stock_delta: -delta,
            line: Some(line.into()),
        })
    }

    /// Fetch a line with its container state, locking the line row for this
    /// transaction so concurrent unpack/set-quantity calls serialize
    async fn lock_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        site_id: Uuid,
        line_id: Uuid,
    ) -> AppResult<LockedLineRow> {
        sqlx::query_as::<_, LockedLineRow>(
            r#"
            SELECT l.id, l.container_id, l.item_id, l.item_name, l.item_reference,
                   l.quantity, l.created_at, l.updated_at,
                   c.identifier AS container_identifier, c.status AS container_status
            FROM container_lines l
            JOIN containers c ON c.id = l.container_id
            JOIN preparations p ON p.id = c.preparation_id
            WHERE l.id = $1 AND p.site_id = $2
            FOR UPDATE OF l
            "#,
        )
        .bind(line_id)
        .bind(site_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Container line".to_string()))
    }

    /// Shared tail of unpack and downward set-quantity: restore stock,
    /// shrink or delete the line, append the `+removed` movement
    async fn shrink_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        site_id: Uuid,
        user_id: Uuid,
        locked: &LockedLineRow,
        removed: i64,
    ) -> AppResult<LineChangeOutcome> {
        apply_stock_delta(tx, site_id, locked.item_id, removed).await?;

        let line = if removed == locked.quantity {
            sqlx::query("DELETE FROM container_lines WHERE id = $1")
                .bind(locked.id)
                .execute(&mut **tx)
                .await?;
            None
        } else {
            let row = sqlx::query_as::<_, crate::services::container::LineRow>(&format!(
                r#"
                UPDATE container_lines
                SET quantity = quantity - $1, updated_at = NOW()
                WHERE id = $2
                RETURNING {LINE_COLUMNS}
                "#,
            ))
            .bind(removed)
            .bind(locked.id)
            .fetch_one(&mut **tx)
            .await?;
            Some(row.into())
        };

        append_movement(
            tx,
            locked.item_id,
            site_id,
            user_id,
            removed,
            &format!("{} {}", reasons::UNPACKED, locked.container_identifier),
            None,
        )
        .await?;

        Ok(LineChangeOutcome {
            stock_delta: removed,
            line,
        })
    }
}

/// Derive an idempotency key from a confirmed code, the target container,
/// and a coarse time bucket, so an accidental double submission of one scan
/// cannot double-apply.
pub fn derive_idempotency_key(confirmed_code: &str, container_id: Uuid, bucket: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(confirmed_code.as_bytes());
    hasher.update(container_id.as_bytes());
    hasher.update(bucket.to_be_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_stable_within_bucket() {
        let container = Uuid::new_v4();
        let a = derive_idempotency_key("ABC123", container, 170);
        let b = derive_idempotency_key("ABC123", container, 170);
        assert_eq!(a, b);
    }

    #[test]
    fn test_idempotency_key_varies() {
        let container = Uuid::new_v4();
        let base = derive_idempotency_key("ABC123", container, 170);
        assert_ne!(base, derive_idempotency_key("ABC124", container, 170));
        assert_ne!(base, derive_idempotency_key("ABC123", container, 171));
        assert_ne!(base, derive_idempotency_key("ABC123", Uuid::new_v4(), 170));
    }

    #[test]
    fn test_idempotency_key_is_hex_sha256() {
        let key = derive_idempotency_key("ABC123", Uuid::nil(), 0);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
