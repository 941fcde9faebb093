//! HTTP handlers for catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{
    CatalogService, CreateItemInput, UpdateItemInput, DEFAULT_SEARCH_LIMIT,
};
use crate::AppState;
use crate::models::CatalogItem;

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for free-text search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

/// Create a catalog item
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<CatalogItem>> {
    let service = CatalogService::new(state.db);
    let item = service
        .create_item(current_user.0.site_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(item))
}

/// Get a catalog item by id
pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<CatalogItem>> {
    let service = CatalogService::new(state.db);
    let item = service
        .get_item(
            current_user.0.site_id,
            current_user.0.can_cross_site(),
            item_id,
        )
        .await?;
    Ok(Json(item))
}

/// Update item metadata
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<CatalogItem>> {
    let service = CatalogService::new(state.db);
    let item = service
        .update_item(current_user.0.site_id, item_id, input)
        .await?;
    Ok(Json(item))
}

/// Delete a catalog item
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = CatalogService::new(state.db);
    service.delete_item(current_user.0.site_id, item_id).await?;
    Ok(Json(()))
}

/// List items for the caller's site
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    let service = CatalogService::new(state.db);
    let items = service
        .list_items(
            current_user.0.site_id,
            query.limit.unwrap_or(100).clamp(1, 500),
            query.offset.unwrap_or(0).max(0),
        )
        .await?;
    Ok(Json(items))
}

/// Free-text catalog search, re-run per keystroke by the UI
pub async fn search_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    let service = CatalogService::new(state.db);
    let items = service
        .search(
            current_user.0.site_id,
            current_user.0.can_cross_site(),
            &query.q,
            query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        )
        .await?;
    Ok(Json(items))
}
