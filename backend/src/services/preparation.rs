//! Shipment preparation service
//!
//! A preparation groups the containers of one shipment between two sites.
//! Its counters are always derived from the containers and lines, never
//! stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Preparation, PreparationSummary};

/// Preparation service
#[derive(Clone)]
pub struct PreparationService {
    db: PgPool,
}

/// Row mapping for preparations
#[derive(Debug, FromRow)]
struct PreparationRow {
    id: Uuid,
    site_id: Uuid,
    destination_site_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PreparationRow> for Preparation {
    fn from(r: PreparationRow) -> Self {
        Preparation {
            id: r.id,
            site_id: r.site_id,
            destination_site_id: r.destination_site_id,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PREPARATION_COLUMNS: &str =
    "id, site_id, destination_site_id, name, created_at, updated_at";

/// Input for creating a preparation
#[derive(Debug, Deserialize)]
pub struct CreatePreparationInput {
    pub name: String,
    pub destination_site_id: Uuid,
}

/// Input for renaming a preparation
#[derive(Debug, Deserialize)]
pub struct UpdatePreparationInput {
    pub name: String,
}

/// Preparation with its derived counters
#[derive(Debug, Serialize)]
pub struct PreparationWithSummary {
    #[serde(flatten)]
    pub preparation: Preparation,
    pub summary: PreparationSummary,
}

impl PreparationService {
    /// Create a new PreparationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a preparation shipping from the caller's site to another site
    pub async fn create(
        &self,
        site_id: Uuid,
        input: CreatePreparationInput,
    ) -> AppResult<Preparation> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Preparation name cannot be empty".to_string(),
                message_fr: "Le nom de l'expédition ne peut pas être vide".to_string(),
            });
        }
        if input.destination_site_id == site_id {
            return Err(AppError::Validation {
                field: "destination_site_id".to_string(),
                message: "Destination site must differ from the origin site".to_string(),
                message_fr: "Le site de destination doit différer du site d'origine".to_string(),
            });
        }

        let destination_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sites WHERE id = $1)",
        )
        .bind(input.destination_site_id)
        .fetch_one(&self.db)
        .await?;

        if !destination_exists {
            return Err(AppError::NotFound("Destination site".to_string()));
        }

        let row = sqlx::query_as::<_, PreparationRow>(&format!(
            r#"
            INSERT INTO preparations (site_id, destination_site_id, name)
            VALUES ($1, $2, $3)
            RETURNING {PREPARATION_COLUMNS}
            "#,
        ))
        .bind(site_id)
        .bind(input.destination_site_id)
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a preparation by id
    pub async fn get(&self, site_id: Uuid, preparation_id: Uuid) -> AppResult<Preparation> {
        let row = sqlx::query_as::<_, PreparationRow>(&format!(
            r#"
            SELECT {PREPARATION_COLUMNS}
            FROM preparations
            WHERE id = $1 AND site_id = $2
            "#,
        ))
        .bind(preparation_id)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Preparation".to_string()))?;

        Ok(row.into())
    }

    /// Get a preparation with its derived counters
    pub async fn get_with_summary(
        &self,
        site_id: Uuid,
        preparation_id: Uuid,
    ) -> AppResult<PreparationWithSummary> {
        let preparation = self.get(site_id, preparation_id).await?;
        let summary = self.summary(preparation_id).await?;

        Ok(PreparationWithSummary {
            preparation,
            summary,
        })
    }

    /// Rename a preparation
    pub async fn update(
        &self,
        site_id: Uuid,
        preparation_id: Uuid,
        input: UpdatePreparationInput,
    ) -> AppResult<Preparation> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Preparation name cannot be empty".to_string(),
                message_fr: "Le nom de l'expédition ne peut pas être vide".to_string(),
            });
        }

        let row = sqlx::query_as::<_, PreparationRow>(&format!(
            r#"
            UPDATE preparations
            SET name = $1, updated_at = NOW()
            WHERE id = $2 AND site_id = $3
            RETURNING {PREPARATION_COLUMNS}
            "#,
        ))
        .bind(input.name.trim())
        .bind(preparation_id)
        .bind(site_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Preparation".to_string()))?;

        Ok(row.into())
    }

    /// List preparations originating from a site, newest first
    pub async fn list(&self, site_id: Uuid) -> AppResult<Vec<Preparation>> {
        let rows = sqlx::query_as::<_, PreparationRow>(&format!(
            r#"
            SELECT {PREPARATION_COLUMNS}
            FROM preparations
            WHERE site_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(site_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Derived counters: container counts over `containers`, packed quantity
    /// over `container_lines`, weight over closed containers
    async fn summary(&self, preparation_id: Uuid) -> AppResult<PreparationSummary> {
        let (container_count, closed_container_count, total_weight_kg) =
            sqlx::query_as::<_, (i64, i64, Option<Decimal>)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'closed'),
                       SUM(weight_kg) FILTER (WHERE status = 'closed')
                FROM containers
                WHERE preparation_id = $1
                "#,
            )
            .bind(preparation_id)
            .fetch_one(&self.db)
            .await?;

        let total_quantity = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(l.quantity), 0)::BIGINT
            FROM container_lines l
            JOIN containers c ON c.id = l.container_id
            WHERE c.preparation_id = $1
            "#,
        )
        .bind(preparation_id)
        .fetch_one(&self.db)
        .await?;

        Ok(PreparationSummary {
            container_count,
            closed_container_count,
            total_quantity,
            total_weight_kg,
        })
    }
}
