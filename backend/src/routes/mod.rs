//! Route definitions for the Livestock Stock Management Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock lifecycle and queries
        .nest("/stock", stock_routes())
}

/// Stock management routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stocks))
        .route("/compra", post(handlers::create_purchase))
        .route("/venta/:stock_id", post(handlers::record_sale))
        .route("/peso/:stock_id", post(handlers::record_weight))
        .route(
            "/details/:stock_id",
            get(handlers::get_stock_details).put(handlers::update_stock),
        )
        .route("/loteNros", get(handlers::get_lote_nros))
        .route("/stockReposicion", get(handlers::get_stock_reposicion))
        .route("/delete", post(handlers::delete_stocks))
        .route("/image/:stock_id", post(handlers::upload_image))
}
