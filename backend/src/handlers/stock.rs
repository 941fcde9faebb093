//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{AdjustStockInput, StockService};
use crate::AppState;
use crate::models::{CatalogItem, Movement};
use shared::types::DateRange;

/// Query parameters for movement listing
#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
}

/// Response for a stock adjustment
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub item_id: Uuid,
    pub new_quantity: i64,
}

/// Response for a net-change query
#[derive(Debug, Serialize)]
pub struct NetChangeResponse {
    pub item_id: Uuid,
    pub net_change: i64,
}

/// Manually adjust stock (receipt, correction, loss)
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<AdjustResponse>> {
    let service = StockService::new(state.db);
    let new_quantity = service
        .adjust(current_user.0.site_id, current_user.0.user_id, &input)
        .await?;
    Ok(Json(AdjustResponse {
        item_id: input.item_id,
        new_quantity,
    }))
}

/// Movements for an item, newest first
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<Movement>>> {
    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        _ => None,
    };

    let service = StockService::new(state.db);
    let movements = service
        .list_movements(current_user.0.site_id, item_id, range.as_ref())
        .await?;
    Ok(Json(movements))
}

/// Net quantity change over a date range, reconstructed from the movement
/// log
pub async fn net_change(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<NetChangeResponse>> {
    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => DateRange { start, end },
        _ => {
            return Err(crate::error::AppError::Validation {
                field: "start/end".to_string(),
                message: "Both start and end dates are required".to_string(),
                message_fr: "Les dates de début et de fin sont requises".to_string(),
            })
        }
    };

    let service = StockService::new(state.db);
    let net = service
        .net_change(current_user.0.site_id, item_id, &range)
        .await?;
    Ok(Json(NetChangeResponse {
        item_id,
        net_change: net,
    }))
}

/// Items at or below their restock threshold
pub async fn below_minimum(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CatalogItem>>> {
    let service = StockService::new(state.db);
    let items = service.below_minimum(current_user.0.site_id).await?;
    Ok(Json(items))
}
