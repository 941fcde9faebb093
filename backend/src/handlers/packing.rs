//! HTTP handlers for packing endpoints
//!
//! Each endpoint maps 1:1 to a coordinator operation; ordering within one
//! container follows the operator's request order.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::packing::{LineChangeOutcome, PackInput, PackOutcome, PackingService};
use crate::AppState;

/// Payload for removing part of a line
#[derive(Debug, Deserialize)]
pub struct UnpackRequest {
    pub quantity: i64,
}

/// Payload for setting a line to an absolute quantity
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Pack an item into a container
pub async fn pack_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(container_id): Path<Uuid>,
    Json(input): Json<PackInput>,
) -> AppResult<Json<PackOutcome>> {
    let service = PackingService::new(state.db);
    let outcome = service
        .pack(
            current_user.0.site_id,
            current_user.0.user_id,
            container_id,
            &input,
        )
        .await?;
    Ok(Json(outcome))
}

/// Remove a quantity from a line, restoring it to stock
pub async fn unpack_line(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(line_id): Path<Uuid>,
    Json(input): Json<UnpackRequest>,
) -> AppResult<Json<LineChangeOutcome>> {
    let service = PackingService::new(state.db);
    let outcome = service
        .unpack(
            current_user.0.site_id,
            current_user.0.user_id,
            line_id,
            input.quantity,
        )
        .await?;
    Ok(Json(outcome))
}

/// Set a line to an absolute quantity (zero removes it)
pub async fn set_line_quantity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(line_id): Path<Uuid>,
    Json(input): Json<SetQuantityRequest>,
) -> AppResult<Json<LineChangeOutcome>> {
    let service = PackingService::new(state.db);
    let outcome = service
        .set_quantity(
            current_user.0.site_id,
            current_user.0.user_id,
            line_id,
            input.quantity,
        )
        .await?;
    Ok(Json(outcome))
}

/// Remove a line entirely, restoring its full quantity to stock
pub async fn remove_line(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(line_id): Path<Uuid>,
) -> AppResult<Json<LineChangeOutcome>> {
    let service = PackingService::new(state.db);
    let outcome = service
        .set_quantity(
            current_user.0.site_id,
            current_user.0.user_id,
            line_id,
            0,
        )
        .await?;
    Ok(Json(outcome))
}
