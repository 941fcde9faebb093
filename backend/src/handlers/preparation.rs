//! HTTP handlers for shipment preparation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::container::ContainerService;
use crate::services::preparation::{
    CreatePreparationInput, PreparationService, PreparationWithSummary, UpdatePreparationInput,
};
use crate::AppState;
use crate::models::{Container, Preparation};

/// Create a preparation
pub async fn create_preparation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePreparationInput>,
) -> AppResult<Json<Preparation>> {
    let service = PreparationService::new(state.db);
    let preparation = service.create(current_user.0.site_id, input).await?;
    Ok(Json(preparation))
}

/// Get a preparation with its derived counters
pub async fn get_preparation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(preparation_id): Path<Uuid>,
) -> AppResult<Json<PreparationWithSummary>> {
    let service = PreparationService::new(state.db);
    let preparation = service
        .get_with_summary(current_user.0.site_id, preparation_id)
        .await?;
    Ok(Json(preparation))
}

/// Rename a preparation
pub async fn update_preparation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(preparation_id): Path<Uuid>,
    Json(input): Json<UpdatePreparationInput>,
) -> AppResult<Json<Preparation>> {
    let service = PreparationService::new(state.db);
    let preparation = service
        .update(current_user.0.site_id, preparation_id, input)
        .await?;
    Ok(Json(preparation))
}

/// List preparations for the caller's site
pub async fn list_preparations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Preparation>>> {
    let service = PreparationService::new(state.db);
    let preparations = service.list(current_user.0.site_id).await?;
    Ok(Json(preparations))
}

/// List the containers of a preparation
pub async fn list_preparation_containers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(preparation_id): Path<Uuid>,
) -> AppResult<Json<Vec<Container>>> {
    let service = ContainerService::new(state.db);
    let containers = service
        .list_by_preparation(current_user.0.site_id, preparation_id)
        .await?;
    Ok(Json(containers))
}
