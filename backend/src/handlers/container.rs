//! HTTP handlers for container lifecycle endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::container::{
    CloseContainerInput, ContainerService, ContainerWithLines, CreateContainerInput,
};
use crate::AppState;
use crate::models::{Container, ContainerLine};

/// Create a container in the open state
pub async fn create_container(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateContainerInput>,
) -> AppResult<Json<Container>> {
    let service = ContainerService::new(state.db);
    let container = service.create(current_user.0.site_id, input).await?;
    Ok(Json(container))
}

/// Get a container with its lines and totals
pub async fn get_container(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(container_id): Path<Uuid>,
) -> AppResult<Json<ContainerWithLines>> {
    let service = ContainerService::new(state.db);
    let container = service
        .get_with_lines(current_user.0.site_id, container_id)
        .await?;
    Ok(Json(container))
}

/// Close a container (one-way transition)
pub async fn close_container(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(container_id): Path<Uuid>,
    Json(input): Json<CloseContainerInput>,
) -> AppResult<Json<Container>> {
    let service = ContainerService::new(state.db);
    let container = service
        .close(current_user.0.site_id, container_id, input)
        .await?;
    Ok(Json(container))
}

/// List the lines of a container
pub async fn list_container_lines(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(container_id): Path<Uuid>,
) -> AppResult<Json<Vec<ContainerLine>>> {
    let service = ContainerService::new(state.db);
    let lines = service.lines(current_user.0.site_id, container_id).await?;
    Ok(Json(lines))
}
