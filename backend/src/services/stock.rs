//! Stock lifecycle service: purchase, weight checks, sale, edit, delete
//!
//! Validates request inputs into typed errors, builds records, and delegates
//! atomic persistence to the entity store. Responses are resolved views with
//! weight history and replenishment serials inlined.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::filter::StockFilterParams;
use shared::metrics::compute_metrics;
use shared::models::{Compra, Peso, Stock, Venta};
use shared::types::{PesoTipo, WeightUnit};
use shared::validation::{
    validate_fecha_venta, validate_nro_lote, validate_nro_stock, validate_peso, validate_precio,
    validate_tipo_stock,
};

use crate::error::{AppError, AppResult};
use crate::store::{PesoChanges, StockChanges, StockStore};

/// Stock service for lifecycle operations and derived views
#[derive(Clone)]
pub struct StockService {
    store: StockStore,
}

/// Input for the purchase (entry) form
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePurchaseInput {
    pub nro_stock: Option<String>,
    pub nro_lote: Option<u32>,
    pub fecha: Option<String>,
    pub peso_entrada: Option<Decimal>,
    pub unidad_peso: WeightUnit,
    pub precio: Option<Decimal>,
    pub tipo_stock: Option<String>,
    /// Stock this purchase replenishes; empty string means none
    pub stock_reposicion: Option<String>,
    pub notas: Option<String>,
}

/// Input for a periodic weight check
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordWeightInput {
    pub fecha: Option<String>,
    pub peso: Option<Decimal>,
    pub unidad_peso: WeightUnit,
}

/// Input for the sale form
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordSaleInput {
    pub fecha: Option<String>,
    pub peso: Option<Decimal>,
    pub unidad_peso: WeightUnit,
    pub precio: Option<Decimal>,
    /// Stock this sale's proceeds replenish; empty string means none
    pub stock_reposicion: Option<String>,
}

/// Partial edit of an existing Stock (details screen edit mode)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStockInput {
    pub tipo_stock: Option<String>,
    pub notas: Option<String>,
    pub perdida: Option<bool>,
    pub fecha_compra: Option<String>,
    pub peso_compra: Option<Decimal>,
    pub unidad_peso: Option<WeightUnit>,
    pub precio_compra: Option<Decimal>,
    pub fecha_venta: Option<String>,
    pub peso_venta: Option<Decimal>,
    pub precio_venta: Option<Decimal>,
}

/// Input for the bulk delete action
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStocksInput {
    pub ids: Vec<Uuid>,
}

/// A Stock resolved for the client: weight history inlined, replenishment
/// links carrying their serials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockView {
    pub id: Uuid,
    pub nro_stock: String,
    pub nro_lote: u32,
    pub serial_nro: String,
    pub tipo_stock: String,
    pub compra: CompraView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venta: Option<VentaView>,
    pub pesos: Vec<Peso>,
    /// Lifted sale replenishment link, used by the listing's sold indicator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposicion: Option<Uuid>,
    pub perdida: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompraView {
    pub fecha: NaiveDate,
    pub precio: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peso: Option<Peso>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposicion: Option<ReposicionRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentaView {
    pub fecha: NaiveDate,
    pub precio: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peso: Option<Peso>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposicion: Option<ReposicionRef>,
}

/// Minimal reference to a linked Stock
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReposicionRef {
    pub id: Uuid,
    pub serial_nro: String,
}

/// Details payload: the resolved Stock plus presentation-rounded derived
/// metrics. `profit` travels beside the body, as the client expects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetails {
    pub response: StockDetailsBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetailsBody {
    #[serde(flatten)]
    pub stock: StockView,
    pub total_precio_compra: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_precio_venta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dias_transcurridos: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peso_promedio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_peso: Option<Peso>,
}

/// Dropdown option for replenishment candidates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReposicionOption {
    pub id: Uuid,
    pub nro_stock: String,
    pub serial_nro: String,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(store: StockStore) -> Self {
        Self { store }
    }

    /// Record a purchase: creates the Stock and its first weight observation
    /// atomically, linking the replenished sale when given.
    pub async fn create_purchase(&self, input: CreatePurchaseInput) -> AppResult<StockView> {
        let nro_stock = input.nro_stock.clone().unwrap_or_default();
        validate_nro_stock(&nro_stock).map_err(|e| AppError::validation("nroStock", e))?;

        let nro_lote = input
            .nro_lote
            .ok_or_else(|| AppError::validation("nroLote", "Batch number is required"))?;
        validate_nro_lote(nro_lote).map_err(|e| AppError::validation("nroLote", e))?;

        let fecha = require_fecha("fecha", &input.fecha)?;

        let peso_entrada = input
            .peso_entrada
            .ok_or_else(|| AppError::validation("pesoEntrada", "Entry weight is required"))?;
        validate_peso(peso_entrada).map_err(|e| AppError::validation("pesoEntrada", e))?;

        let precio = input
            .precio
            .ok_or_else(|| AppError::validation("precio", "Price per weight is required"))?;
        validate_precio(precio).map_err(|e| AppError::validation("precio", e))?;

        let tipo_stock = input.tipo_stock.clone().unwrap_or_default();
        validate_tipo_stock(&tipo_stock).map_err(|e| AppError::validation("tipoStock", e))?;

        let reposicion = parse_reposicion(&input.stock_reposicion)?;

        let now = Utc::now();
        let stock_id = Uuid::new_v4();
        let compra_peso = Peso {
            id: Uuid::new_v4(),
            stock: stock_id,
            fecha,
            peso: peso_entrada,
            unidad: input.unidad_peso,
            tipo: PesoTipo::Compra,
            created_at: now,
        };
        let stock = Stock {
            id: stock_id,
            nro_stock: nro_stock.trim().to_string(),
            nro_lote,
            serial_nro: Stock::compose_serial(&nro_stock, nro_lote),
            tipo_stock,
            compra: Compra {
                fecha,
                precio,
                peso: compra_peso.id,
                reposicion,
            },
            venta: None,
            pesos: vec![compra_peso.id],
            perdida: false,
            notas: input.notas.clone().filter(|n| !n.trim().is_empty()),
            imagen: None,
            created_at: now,
            updated_at: now,
        };

        let stock = self.store.insert_stock(stock, compra_peso).await?;
        tracing::info!(serial = %stock.serial_nro, "stock purchased");
        self.view_of(stock.id).await
    }

    /// Append a periodic weight check to an existing Stock.
    pub async fn record_weight(&self, stock_id: Uuid, input: RecordWeightInput) -> AppResult<Peso> {
        let fecha = require_fecha("fecha", &input.fecha)?;
        let value = input
            .peso
            .ok_or_else(|| AppError::validation("peso", "Weight is required"))?;
        validate_peso(value).map_err(|e| AppError::validation("peso", e))?;

        let peso = Peso {
            id: Uuid::new_v4(),
            stock: stock_id,
            fecha,
            peso: value,
            unidad: input.unidad_peso,
            tipo: PesoTipo::Control,
            created_at: Utc::now(),
        };
        self.store.append_peso(stock_id, peso).await
    }

    /// Record a sale. The Sold-state check is re-run by the store at commit
    /// time, so a concurrent second sale fails even if it passed here.
    pub async fn record_sale(
        &self,
        stock_id: Uuid,
        input: RecordSaleInput,
    ) -> AppResult<StockView> {
        let existing = self.store.get_stock(stock_id).await?;
        if existing.is_sold() {
            return Err(AppError::InvalidState(
                "Stock has already been sold".to_string(),
            ));
        }

        let fecha = require_fecha("fecha", &input.fecha)?;
        validate_fecha_venta(existing.compra.fecha, fecha)
            .map_err(|e| AppError::validation("fecha", e))?;

        let value = input
            .peso
            .ok_or_else(|| AppError::validation("peso", "Sale weight is required"))?;
        validate_peso(value).map_err(|e| AppError::validation("peso", e))?;

        let precio = input
            .precio
            .ok_or_else(|| AppError::validation("precio", "Price per weight is required"))?;
        validate_precio(precio).map_err(|e| AppError::validation("precio", e))?;

        let reposicion = parse_reposicion(&input.stock_reposicion)?;

        let now = Utc::now();
        let sale_peso = Peso {
            id: Uuid::new_v4(),
            stock: stock_id,
            fecha,
            peso: value,
            unidad: input.unidad_peso,
            tipo: PesoTipo::Venta,
            created_at: now,
        };
        let venta = Venta {
            fecha,
            precio,
            peso: sale_peso.id,
            reposicion,
        };

        let stock = self.store.record_sale(stock_id, venta, sale_peso).await?;
        tracing::info!(serial = %stock.serial_nro, "stock sold");
        self.view_of(stock.id).await
    }

    /// The explicit edit path for a Stock and its embedded observations.
    pub async fn update_stock(
        &self,
        stock_id: Uuid,
        input: UpdateStockInput,
    ) -> AppResult<StockView> {
        let existing = self.store.get_stock(stock_id).await?;

        if let Some(tipo) = &input.tipo_stock {
            validate_tipo_stock(tipo).map_err(|e| AppError::validation("tipoStock", e))?;
        }
        if let Some(peso) = input.peso_compra {
            validate_peso(peso).map_err(|e| AppError::validation("pesoCompra", e))?;
        }
        if let Some(precio) = input.precio_compra {
            validate_precio(precio).map_err(|e| AppError::validation("precioCompra", e))?;
        }
        if let Some(peso) = input.peso_venta {
            validate_peso(peso).map_err(|e| AppError::validation("pesoVenta", e))?;
        }
        if let Some(precio) = input.precio_venta {
            validate_precio(precio).map_err(|e| AppError::validation("precioVenta", e))?;
        }

        let fecha_compra = optional_fecha("fechaCompra", &input.fecha_compra)?;
        let fecha_venta = optional_fecha("fechaVenta", &input.fecha_venta)?;

        // Dates must stay ordered after the edit is applied.
        let effective_compra = fecha_compra.unwrap_or(existing.compra.fecha);
        if let Some(venta) = &existing.venta {
            let effective_venta = fecha_venta.unwrap_or(venta.fecha);
            validate_fecha_venta(effective_compra, effective_venta)
                .map_err(|e| AppError::validation("fechaVenta", e))?;
        }

        let stock = self
            .store
            .update_stock(
                stock_id,
                StockChanges {
                    tipo_stock: input.tipo_stock.clone(),
                    notas: input.notas.clone(),
                    perdida: input.perdida,
                    imagen: None,
                    fecha_compra,
                    precio_compra: input.precio_compra,
                    fecha_venta,
                    precio_venta: input.precio_venta,
                },
            )
            .await?;

        // Weight corrections go through the owned observation so its tipo and
        // identity are preserved.
        if input.peso_compra.is_some() || input.unidad_peso.is_some() || fecha_compra.is_some() {
            self.store
                .update_peso(
                    stock_id,
                    stock.compra.peso,
                    PesoChanges {
                        fecha: fecha_compra,
                        peso: input.peso_compra,
                        unidad: input.unidad_peso,
                    },
                )
                .await?;
        }
        if let Some(venta) = &stock.venta {
            if input.peso_venta.is_some() || fecha_venta.is_some() {
                self.store
                    .update_peso(
                        stock_id,
                        venta.peso,
                        PesoChanges {
                            fecha: fecha_venta,
                            peso: input.peso_venta,
                            unidad: None,
                        },
                    )
                    .await?;
            }
        }

        self.view_of(stock_id).await
    }

    /// Cascading bulk delete; absent ids are a no-op.
    pub async fn delete_stocks(&self, ids: &[Uuid]) -> AppResult<usize> {
        let removed = self.store.delete_stocks(ids).await?;
        tracing::info!(requested = ids.len(), removed, "stocks deleted");
        Ok(removed)
    }

    /// Attach an uploaded image filename reference.
    pub async fn attach_image(&self, stock_id: Uuid, filename: String) -> AppResult<StockView> {
        self.store
            .update_stock(
                stock_id,
                StockChanges {
                    imagen: Some(filename),
                    ..StockChanges::default()
                },
            )
            .await?;
        self.view_of(stock_id).await
    }

    /// Filtered listing, newest first.
    pub async fn list_stocks(&self, params: &StockFilterParams) -> AppResult<Vec<StockView>> {
        let filter = params.normalize();
        let stocks = self.store.list_stocks(&filter).await?;
        let mut views = Vec::with_capacity(stocks.len());
        for (stock, pesos) in stocks {
            views.push(self.build_view(stock, pesos).await?);
        }
        Ok(views)
    }

    /// One Stock with its derived metrics, rounded for display.
    pub async fn get_details(&self, stock_id: Uuid) -> AppResult<StockDetails> {
        let (stock, pesos) = self.store.get_stock_with_pesos(stock_id).await?;
        let metrics = compute_metrics(&stock, &pesos).rounded_for_display();
        let view = self.build_view(stock, pesos).await?;
        Ok(StockDetails {
            response: StockDetailsBody {
                stock: view,
                total_precio_compra: metrics.total_precio_compra,
                total_precio_venta: metrics.total_precio_venta,
                dias_transcurridos: metrics.dias_transcurridos,
                peso_promedio: metrics.peso_promedio,
                last_peso: metrics.last_peso,
            },
            profit: metrics.profit,
        })
    }

    /// Distinct batch numbers for the filter form.
    pub async fn list_lote_nros(&self) -> AppResult<Vec<u32>> {
        self.store.list_lote_nros().await
    }

    /// Stocks eligible as replenishment targets for a new purchase.
    pub async fn list_replenishment_candidates(&self) -> AppResult<Vec<ReposicionOption>> {
        let candidates = self.store.list_replenishment_candidates().await?;
        Ok(candidates
            .into_iter()
            .map(|s| ReposicionOption {
                id: s.id,
                nro_stock: s.nro_stock,
                serial_nro: s.serial_nro,
            })
            .collect())
    }

    async fn view_of(&self, stock_id: Uuid) -> AppResult<StockView> {
        let (stock, pesos) = self.store.get_stock_with_pesos(stock_id).await?;
        self.build_view(stock, pesos).await
    }

    async fn build_view(&self, stock: Stock, pesos: Vec<Peso>) -> AppResult<StockView> {
        let find = |id: Uuid| pesos.iter().find(|p| p.id == id).cloned();

        let compra = CompraView {
            fecha: stock.compra.fecha,
            precio: stock.compra.precio,
            peso: find(stock.compra.peso),
            reposicion: self.reposicion_ref(stock.compra.reposicion).await?,
        };
        let venta = match &stock.venta {
            Some(v) => Some(VentaView {
                fecha: v.fecha,
                precio: v.precio,
                peso: find(v.peso),
                reposicion: self.reposicion_ref(v.reposicion).await?,
            }),
            None => None,
        };

        Ok(StockView {
            id: stock.id,
            nro_stock: stock.nro_stock,
            nro_lote: stock.nro_lote,
            serial_nro: stock.serial_nro,
            tipo_stock: stock.tipo_stock,
            compra,
            reposicion: stock.venta.as_ref().and_then(|v| v.reposicion),
            venta,
            pesos,
            perdida: stock.perdida,
            notas: stock.notas,
            imagen: stock.imagen,
            created_at: stock.created_at,
            updated_at: stock.updated_at,
        })
    }

    async fn reposicion_ref(&self, id: Option<Uuid>) -> AppResult<Option<ReposicionRef>> {
        let Some(id) = id else {
            return Ok(None);
        };
        match self.store.get_stock(id).await {
            Ok(stock) => Ok(Some(ReposicionRef {
                id: stock.id,
                serial_nro: stock.serial_nro,
            })),
            // The link target can vanish between the read and this lookup;
            // a dangling serial is display-only.
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn require_fecha(field: &str, value: &Option<String>) -> AppResult<NaiveDate> {
    let raw = value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation(field, "Date is required"))?;
    parse_fecha_str(raw).ok_or_else(|| AppError::validation(field, "Unrecognized date format"))
}

fn optional_fecha(field: &str, value: &Option<String>) -> AppResult<Option<NaiveDate>> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_fecha_str(raw)
            .map(Some)
            .ok_or_else(|| AppError::validation(field, "Unrecognized date format")),
        None => Ok(None),
    }
}

fn parse_fecha_str(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// An empty or missing replenishment field means "none"; anything else must
/// be a well-formed id.
fn parse_reposicion(value: &Option<String>) -> AppResult<Option<Uuid>> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::validation("stockReposicion", "Malformed stock reference")),
        None => Ok(None),
    }
}
