//! Container ("box") lifecycle service
//!
//! Owns creation, identifier uniqueness within a preparation, the one-way
//! `open → closed` transition, and the aggregate content reads. Content
//! mutation itself lives in the packing service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Container, ContainerLine, ContainerStatus, ContainerTotals};
use shared::validation::validate_container_identifier;

/// Container lifecycle service
#[derive(Clone)]
pub struct ContainerService {
    db: PgPool,
}

/// Row mapping for containers
#[derive(Debug, FromRow)]
pub(crate) struct ContainerRow {
    pub id: Uuid,
    pub preparation_id: Uuid,
    pub identifier: String,
    pub status: String,
    pub weight_kg: Option<Decimal>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContainerRow> for Container {
    fn from(r: ContainerRow) -> Self {
        Container {
            id: r.id,
            preparation_id: r.preparation_id,
            identifier: r.identifier,
            // Unknown statuses cannot exist under the CHECK constraint
            status: ContainerStatus::parse(&r.status).unwrap_or(ContainerStatus::Closed),
            weight_kg: r.weight_kg,
            closed_at: r.closed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Row mapping for container lines
#[derive(Debug, FromRow)]
pub(crate) struct LineRow {
    pub id: Uuid,
    pub container_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_reference: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LineRow> for ContainerLine {
    fn from(r: LineRow) -> Self {
        ContainerLine {
            id: r.id,
            container_id: r.container_id,
            item_id: r.item_id,
            item_name: r.item_name,
            item_reference: r.item_reference,
            quantity: r.quantity,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub(crate) const CONTAINER_COLUMNS: &str =
    "id, preparation_id, identifier, status, weight_kg, closed_at, created_at, updated_at";

pub(crate) const LINE_COLUMNS: &str =
    "id, container_id, item_id, item_name, item_reference, quantity, created_at, updated_at";

/// Input for creating a container
#[derive(Debug, Deserialize)]
pub struct CreateContainerInput {
    pub preparation_id: Uuid,
    pub identifier: String,
}

/// Input for closing a container
#[derive(Debug, Deserialize)]
pub struct CloseContainerInput {
    /// Weight of the sealed box, when it was put on the scale
    pub weight_kg: Option<Decimal>,
}

/// Container with its content for detail screens
#[derive(Debug, Serialize)]
pub struct ContainerWithLines {
    #[serde(flatten)]
    pub container: Container,
    pub lines: Vec<ContainerLine>,
    pub totals: ContainerTotals,
}

impl ContainerService {
    /// Create a new ContainerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a container in the `open` state with zero lines.
    ///
    /// The identifier must be unique within the preparation,
    /// case-insensitively; the partial unique index backs the service-level
    /// check against races.
    pub async fn create(&self, site_id: Uuid, input: CreateContainerInput) -> AppResult<Container> {
        let identifier = input.identifier.trim();
        validate_container_identifier(identifier).map_err(|msg| AppError::Validation {
            field: "identifier".to_string(),
            message: msg.to_string(),
            message_fr: "Identifiant de colis invalide".to_string(),
        })?;

        // Preparation must exist and originate from the caller's site
        let preparation_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM preparations WHERE id = $1 AND site_id = $2)",
        )
        .bind(input.preparation_id)
        .bind(site_id)
        .fetch_one(&self.db)
        .await?;

        if !preparation_exists {
            return Err(AppError::NotFound("Preparation".to_string()));
        }

        let duplicate = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM containers
                WHERE preparation_id = $1 AND LOWER(identifier) = LOWER($2)
            )
            "#,
        )
        .bind(input.preparation_id)
        .bind(identifier)
        .fetch_one(&self.db)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry("container identifier".to_string()));
        }

        let result = sqlx::query_as::<_, ContainerRow>(&format!(
            r#"
            INSERT INTO containers (preparation_id, identifier, status)
            VALUES ($1, $2, 'open')
            RETURNING {CONTAINER_COLUMNS}
            "#,
        ))
        .bind(input.preparation_id)
        .bind(identifier)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            // Concurrent creation with the same identifier loses to the
            // unique index
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                Err(AppError::DuplicateEntry("container identifier".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a container by id, scoped through its preparation's origin site
    pub async fn get(&self, site_id: Uuid, container_id: Uuid) -> AppResult<Container> {
        let row = sqlx::query_as::<_, ContainerRow>(
            r#"
            SELECT c.id, c.preparation_id, c.identifier, c.status, c.weight_kg,
                   c.closed_at, c.created_at, c.updated_at
            FROM containers c
            JOIN preparations p ON p.id = c.preparation_id
            WHERE c.id = $1 AND p.site_id = $2
            "#,
        )
        .bind(container_id)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Container".to_string()))?;

        Ok(row.into())
    }

    /// Get a container with its lines and on-demand totals
    pub async fn get_with_lines(
        &self,
        site_id: Uuid,
        container_id: Uuid,
    ) -> AppResult<ContainerWithLines> {
        let container = self.get(site_id, container_id).await?;
        let lines = self.lines(site_id, container_id).await?;
        let totals = self.totals(container_id).await?;

        Ok(ContainerWithLines {
            container,
            lines,
            totals,
        })
    }

    /// List containers of a preparation, identifier order
    pub async fn list_by_preparation(
        &self,
        site_id: Uuid,
        preparation_id: Uuid,
    ) -> AppResult<Vec<Container>> {
        let rows = sqlx::query_as::<_, ContainerRow>(
            r#"
            SELECT c.id, c.preparation_id, c.identifier, c.status, c.weight_kg,
                   c.closed_at, c.created_at, c.updated_at
            FROM containers c
            JOIN preparations p ON p.id = c.preparation_id
            WHERE c.preparation_id = $1 AND p.site_id = $2
            ORDER BY c.identifier
            "#,
        )
        .bind(preparation_id)
        .bind(site_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Close a container. One-way: a closed container never reopens, and the
    /// conditional UPDATE makes a double close impossible under races.
    pub async fn close(
        &self,
        site_id: Uuid,
        container_id: Uuid,
        input: CloseContainerInput,
    ) -> AppResult<Container> {
        if let Some(weight) = input.weight_kg {
            if weight <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "weight_kg".to_string(),
                    message: "Weight must be positive".to_string(),
                    message_fr: "Le poids doit être positif".to_string(),
                });
            }
        }

        let row = sqlx::query_as::<_, ContainerRow>(
            r#"
            UPDATE containers c
            SET status = 'closed', closed_at = NOW(), weight_kg = $1, updated_at = NOW()
            FROM preparations p
            WHERE c.id = $2 AND p.id = c.preparation_id AND p.site_id = $3 AND c.status = 'open'
            RETURNING c.id, c.preparation_id, c.identifier, c.status, c.weight_kg,
                      c.closed_at, c.created_at, c.updated_at
            "#,
        )
        .bind(input.weight_kg)
        .bind(container_id)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                // Either the container does not exist for this site, or it
                // is already closed
                let existing = self.get(site_id, container_id).await?;
                Err(AppError::InvalidStateTransition(format!(
                    "container {} is already {}",
                    existing.identifier, existing.status
                )))
            }
        }
    }

    /// Lines of a container
    pub async fn lines(&self, site_id: Uuid, container_id: Uuid) -> AppResult<Vec<ContainerLine>> {
        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT l.id, l.container_id, l.item_id, l.item_name, l.item_reference,
                   l.quantity, l.created_at, l.updated_at
            FROM container_lines l
            JOIN containers c ON c.id = l.container_id
            JOIN preparations p ON p.id = c.preparation_id
            WHERE l.container_id = $1 AND p.site_id = $2
            ORDER BY l.created_at
            "#,
        )
        .bind(container_id)
        .bind(site_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Aggregate line count and total quantity, computed on demand and never
    /// cached
    pub async fn totals(&self, container_id: Uuid) -> AppResult<ContainerTotals> {
        let (line_count, total_quantity) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(quantity), 0)::BIGINT
            FROM container_lines
            WHERE container_id = $1
            "#,
        )
        .bind(container_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ContainerTotals {
            line_count,
            total_quantity,
        })
    }
}
