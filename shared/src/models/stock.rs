//! Stock: one tracked animal or batch unit, from purchase through optional sale

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked inventory unit. Created by a purchase, optionally closed by a
/// sale; weight history lives in owned [`Peso`](crate::models::Peso) records
/// referenced by id, latest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: Uuid,
    /// User-entered animal number/tag
    pub nro_stock: String,
    /// User-entered batch number (>= 1)
    pub nro_lote: u32,
    /// Human-facing composite identifier, `nroStock-nroLote`. Unique.
    pub serial_nro: String,
    /// Cattle-type label, one of [`CATTLE_TYPES`](crate::validation::CATTLE_TYPES)
    pub tipo_stock: String,
    pub compra: Compra,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venta: Option<Venta>,
    /// Owned weight observations, most recently inserted first
    pub pesos: Vec<Uuid>,
    /// Marked lost/death
    pub perdida: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    /// Attached image filename reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase sub-record. Always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compra {
    pub fecha: NaiveDate,
    /// Price per kg
    pub precio: Decimal,
    /// The purchase weight observation
    pub peso: Uuid,
    /// Prior Stock whose sale this purchase replenishes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposicion: Option<Uuid>,
}

/// Sale sub-record. Absent until a sale is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venta {
    pub fecha: NaiveDate,
    /// Price per kg
    pub precio: Decimal,
    /// The sale weight observation
    pub peso: Uuid,
    /// Stock whose purchase this sale's proceeds funded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposicion: Option<Uuid>,
}

impl Stock {
    /// Compose the human-facing serial from its two user-entered parts.
    pub fn compose_serial(nro_stock: &str, nro_lote: u32) -> String {
        format!("{}-{}", nro_stock.trim(), nro_lote)
    }

    pub fn is_sold(&self) -> bool {
        self.venta.is_some()
    }

    /// Sold and linked to a replenishing purchase
    pub fn is_replenished(&self) -> bool {
        self.venta.as_ref().is_some_and(|v| v.reposicion.is_some())
    }
}
