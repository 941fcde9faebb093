//! Route definitions for the Fleet Operations Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - scanning
        .nest("/scan", scan_routes())
        // Protected routes - catalog
        .nest("/catalog", catalog_routes())
        // Protected routes - shipment preparations
        .nest("/preparations", preparation_routes())
        // Protected routes - containers
        .nest("/containers", container_routes())
        // Protected routes - packing lines
        .nest("/packing", packing_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Scan routes (protected)
fn scan_routes() -> Router<AppState> {
    Router::new()
        // Manual entry and confirmed codes share one resolution endpoint
        .route("/resolve", post(handlers::resolve_code))
        .route("/decode", post(handlers::decode_image))
        .route("/config", get(handlers::scan_config))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Catalog routes (protected)
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/items/search", get(handlers::search_items))
        .route(
            "/items/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Preparation routes (protected)
fn preparation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_preparations).post(handlers::create_preparation),
        )
        .route(
            "/:preparation_id",
            get(handlers::get_preparation).put(handlers::update_preparation),
        )
        .route(
            "/:preparation_id/containers",
            get(handlers::list_preparation_containers),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Container routes (protected)
fn container_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_container))
        .route("/:container_id", get(handlers::get_container))
        .route("/:container_id/close", post(handlers::close_container))
        .route(
            "/:container_id/lines",
            get(handlers::list_container_lines).post(handlers::pack_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Packing line routes (protected)
fn packing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/lines/:line_id",
            put(handlers::set_line_quantity).delete(handlers::remove_line),
        )
        .route("/lines/:line_id/unpack", post(handlers::unpack_line))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(handlers::adjust_stock))
        .route("/items/:item_id/movements", get(handlers::list_movements))
        .route("/items/:item_id/net-change", get(handlers::net_change))
        .route("/below-minimum", get(handlers::below_minimum))
        .route_layer(middleware::from_fn(auth_middleware))
}
