//! HTTP handlers for stock lifecycle endpoints
//!
//! Every response uses the `{ ok: true, ... }` envelope; failures are
//! serialized by [`AppError`](crate::error::AppError) as
//! `{ ok: false, errorMsg }`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared::filter::StockFilterParams;

use crate::error::AppResult;
use crate::services::stock::{
    CreatePurchaseInput, DeleteStocksInput, RecordSaleInput, RecordWeightInput, StockService,
    UpdateStockInput,
};
use crate::AppState;

/// List stocks, applying the filter specification from the query string
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(params): Query<StockFilterParams>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let stocks = service.list_stocks(&params).await?;
    Ok(Json(json!({ "ok": true, "stocks": stocks })))
}

/// Get one stock with its derived metrics
pub async fn get_stock_details(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let details = service.get_details(stock_id).await?;
    Ok(Json(json!({ "ok": true, "stockDetails": details })))
}

/// Record a purchase, creating the stock and its entry weight
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseInput>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let stock = service.create_purchase(input).await?;
    Ok(Json(json!({ "ok": true, "stock": stock })))
}

/// Record a sale on an existing stock
pub async fn record_sale(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let stock = service.record_sale(stock_id, input).await?;
    Ok(Json(json!({ "ok": true, "stock": stock })))
}

/// Record a periodic weight check
pub async fn record_weight(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<RecordWeightInput>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let peso = service.record_weight(stock_id, input).await?;
    Ok(Json(json!({ "ok": true, "peso": peso })))
}

/// Edit an existing stock
pub async fn update_stock(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<UpdateStockInput>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let stock = service.update_stock(stock_id, input).await?;
    Ok(Json(json!({ "ok": true, "stock": stock })))
}

/// Bulk delete with cascading cleanup
pub async fn delete_stocks(
    State(state): State<AppState>,
    Json(input): Json<DeleteStocksInput>,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let deleted = service.delete_stocks(&input.ids).await?;
    Ok(Json(json!({ "ok": true, "deletedCount": deleted })))
}

/// Distinct batch numbers for the filter form
pub async fn get_lote_nros(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let lote_nros = service.list_lote_nros().await?;
    Ok(Json(json!({ "ok": true, "loteNros": lote_nros })))
}

/// Stocks eligible as replenishment targets for a new purchase
pub async fn get_stock_reposicion(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());
    let candidates = service.list_replenishment_candidates().await?;
    Ok(Json(json!({ "ok": true, "stockReposicion": candidates })))
}
