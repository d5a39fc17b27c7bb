//! Image attachment handler
//!
//! Uploads are an opaque side channel: the file lands in the configured
//! directory and the stock keeps only the filename reference.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock::StockService;
use crate::AppState;

/// Attach an uploaded image to a stock
pub async fn upload_image(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let service = StockService::new(state.store.clone());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let field_name = field.name().unwrap_or("image").to_string();
        let ext = field
            .file_name()
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, e)| format!(".{}", e))
            .unwrap_or_default();

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        if data.len() > state.config.upload.max_bytes {
            return Err(AppError::Upload("file exceeds the size limit".to_string()));
        }

        let filename = format!("{}_{}{}", field_name, Utc::now().timestamp_millis(), ext);
        let dest = std::path::Path::new(&state.config.upload.dir).join(&filename);
        tokio::fs::write(&dest, &data)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let stock = service.attach_image(stock_id, filename.clone()).await?;
        return Ok(Json(
            json!({ "ok": true, "filename": filename, "stock": stock }),
        ));
    }

    Err(AppError::Upload("no file supplied".to_string()))
}
