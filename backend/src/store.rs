//! Arena-style entity store for Stock and Peso records
//!
//! Records live in id-keyed maps behind a single `tokio::sync::RwLock`.
//! Every compound operation runs under one write-lock acquisition, so writers
//! are serialized, readers only ever observe committed state, and no partial
//! creation is visible. Replenishment links are plain id references validated
//! at write time; they are never traversed for ownership.
//!
//! Every lock acquisition is wrapped in a bounded timeout. Expiry surfaces as
//! [`AppError::StoreTimeout`], distinct from validation and not-found
//! failures, so callers can retry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::timeout;
use uuid::Uuid;

use shared::models::{Peso, Stock, Venta};
use shared::types::WeightUnit;
use shared::StockFilter;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct StoreInner {
    stocks: HashMap<Uuid, Stock>,
    pesos: HashMap<Uuid, Peso>,
}

/// Handle to the shared entity store. Cheap to clone.
#[derive(Clone)]
pub struct StockStore {
    inner: Arc<RwLock<StoreInner>>,
    op_timeout: Duration,
}

/// Partial update applied to a Stock through the explicit edit path.
#[derive(Debug, Default)]
pub struct StockChanges {
    pub tipo_stock: Option<String>,
    pub notas: Option<String>,
    pub perdida: Option<bool>,
    pub imagen: Option<String>,
    pub fecha_compra: Option<NaiveDate>,
    pub precio_compra: Option<Decimal>,
    pub fecha_venta: Option<NaiveDate>,
    pub precio_venta: Option<Decimal>,
}

/// Partial update applied to a Peso through the explicit edit path.
#[derive(Debug, Default)]
pub struct PesoChanges {
    pub fecha: Option<NaiveDate>,
    pub peso: Option<Decimal>,
    pub unidad: Option<WeightUnit>,
}

impl StockStore {
    pub fn new(op_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            op_timeout,
        }
    }

    async fn read(&self) -> AppResult<RwLockReadGuard<'_, StoreInner>> {
        timeout(self.op_timeout, self.inner.read())
            .await
            .map_err(|_| AppError::StoreTimeout)
    }

    async fn write(&self) -> AppResult<RwLockWriteGuard<'_, StoreInner>> {
        timeout(self.op_timeout, self.inner.write())
            .await
            .map_err(|_| AppError::StoreTimeout)
    }

    fn resolved_pesos(inner: &StoreInner, stock: &Stock) -> Vec<Peso> {
        stock
            .pesos
            .iter()
            .filter_map(|id| inner.pesos.get(id))
            .cloned()
            .collect()
    }

    /// Atomically insert a new Stock together with its purchase observation.
    /// Both persist or neither does.
    pub async fn insert_stock(&self, mut stock: Stock, mut compra_peso: Peso) -> AppResult<Stock> {
        let mut guard = self.write().await?;
        let inner = &mut *guard;

        if inner
            .stocks
            .values()
            .any(|s| s.serial_nro == stock.serial_nro)
        {
            return Err(AppError::validation(
                "serialNro",
                format!("A stock with serial {} already exists", stock.serial_nro),
            ));
        }

        if let Some(target_id) = stock.compra.reposicion {
            let target = inner.stocks.get(&target_id).ok_or_else(|| {
                AppError::ReferentialIntegrity(
                    "Replenishment reference points to a nonexistent stock".to_string(),
                )
            })?;
            match &target.venta {
                None => {
                    return Err(AppError::InvalidState(
                        "Replenishment target has not been sold".to_string(),
                    ))
                }
                Some(venta) if venta.reposicion.is_some() => {
                    return Err(AppError::InvalidState(
                        "Replenishment target is already replenished".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        // All checks passed; commit every side of the write at once.
        compra_peso.stock = stock.id;
        stock.compra.peso = compra_peso.id;
        stock.pesos = vec![compra_peso.id];

        if let Some(target_id) = stock.compra.reposicion {
            if let Some(target) = inner.stocks.get_mut(&target_id) {
                if let Some(venta) = target.venta.as_mut() {
                    venta.reposicion = Some(stock.id);
                }
                target.updated_at = stock.created_at;
            }
        }

        inner.pesos.insert(compra_peso.id, compra_peso);
        inner.stocks.insert(stock.id, stock.clone());
        Ok(stock)
    }

    pub async fn get_stock(&self, id: Uuid) -> AppResult<Stock> {
        let inner = self.read().await?;
        inner
            .stocks
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))
    }

    /// A Stock together with its resolved weight history, stored order
    /// (newest first).
    pub async fn get_stock_with_pesos(&self, id: Uuid) -> AppResult<(Stock, Vec<Peso>)> {
        let inner = self.read().await?;
        let stock = inner
            .stocks
            .get(&id)
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;
        let pesos = Self::resolved_pesos(&inner, stock);
        Ok((stock.clone(), pesos))
    }

    /// Full retrieval with the filter predicate applied, newest first.
    pub async fn list_stocks(&self, filter: &StockFilter) -> AppResult<Vec<(Stock, Vec<Peso>)>> {
        let inner = self.read().await?;
        let mut stocks: Vec<(Stock, Vec<Peso>)> = inner
            .stocks
            .values()
            .map(|s| (s.clone(), Self::resolved_pesos(&inner, s)))
            .filter(|(stock, pesos)| filter.matches(stock, pesos))
            .collect();
        stocks.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(stocks)
    }

    /// Append a weight observation to an existing Stock.
    pub async fn append_peso(&self, stock_id: Uuid, mut peso: Peso) -> AppResult<Peso> {
        let mut guard = self.write().await?;
        let inner = &mut *guard;

        let stock = inner
            .stocks
            .get_mut(&stock_id)
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;

        peso.stock = stock_id;
        stock.pesos.insert(0, peso.id);
        stock.updated_at = Utc::now();
        inner.pesos.insert(peso.id, peso.clone());
        Ok(peso)
    }

    /// Commit a sale: re-checks the Sold state under the write lock so a
    /// concurrent double-sale loses deterministically, then writes the sale
    /// sub-record, its observation and the reciprocal replenishment link as
    /// one unit.
    pub async fn record_sale(
        &self,
        stock_id: Uuid,
        mut venta: Venta,
        mut sale_peso: Peso,
    ) -> AppResult<Stock> {
        let mut guard = self.write().await?;
        let inner = &mut *guard;

        let stock = inner
            .stocks
            .get(&stock_id)
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;
        if stock.venta.is_some() {
            return Err(AppError::InvalidState(
                "Stock has already been sold".to_string(),
            ));
        }

        if let Some(target_id) = venta.reposicion {
            if target_id == stock_id {
                return Err(AppError::ReferentialIntegrity(
                    "A stock cannot replenish itself".to_string(),
                ));
            }
            let target = inner.stocks.get(&target_id).ok_or_else(|| {
                AppError::ReferentialIntegrity(
                    "Replenishment reference points to a nonexistent stock".to_string(),
                )
            })?;
            if target.compra.reposicion.is_some() {
                return Err(AppError::InvalidState(
                    "Replenishment target already replenishes another sale".to_string(),
                ));
            }
        }

        let now = Utc::now();
        sale_peso.stock = stock_id;
        venta.peso = sale_peso.id;

        if let Some(target_id) = venta.reposicion {
            if let Some(target) = inner.stocks.get_mut(&target_id) {
                target.compra.reposicion = Some(stock_id);
                target.updated_at = now;
            }
        }

        inner.pesos.insert(sale_peso.id, sale_peso.clone());
        let stock = inner
            .stocks
            .get_mut(&stock_id)
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;
        stock.venta = Some(venta);
        stock.pesos.insert(0, sale_peso.id);
        stock.updated_at = now;
        Ok(stock.clone())
    }

    /// Apply a partial update to a Stock.
    pub async fn update_stock(&self, id: Uuid, changes: StockChanges) -> AppResult<Stock> {
        let mut guard = self.write().await?;
        let stock = guard
            .stocks
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;

        if (changes.fecha_venta.is_some() || changes.precio_venta.is_some())
            && stock.venta.is_none()
        {
            return Err(AppError::InvalidState(
                "Stock has not been sold".to_string(),
            ));
        }

        if let Some(tipo) = changes.tipo_stock {
            stock.tipo_stock = tipo;
        }
        if let Some(notas) = changes.notas {
            stock.notas = if notas.trim().is_empty() {
                None
            } else {
                Some(notas)
            };
        }
        if let Some(perdida) = changes.perdida {
            stock.perdida = perdida;
        }
        if let Some(imagen) = changes.imagen {
            stock.imagen = Some(imagen);
        }
        if let Some(fecha) = changes.fecha_compra {
            stock.compra.fecha = fecha;
        }
        if let Some(precio) = changes.precio_compra {
            stock.compra.precio = precio;
        }
        if let Some(venta) = stock.venta.as_mut() {
            if let Some(fecha) = changes.fecha_venta {
                venta.fecha = fecha;
            }
            if let Some(precio) = changes.precio_venta {
                venta.precio = precio;
            }
        }

        stock.updated_at = Utc::now();
        Ok(stock.clone())
    }

    /// Apply a partial update to a weight observation, scoped by its owning
    /// Stock.
    pub async fn update_peso(
        &self,
        stock_id: Uuid,
        peso_id: Uuid,
        changes: PesoChanges,
    ) -> AppResult<Peso> {
        let mut guard = self.write().await?;
        let inner = &mut *guard;

        let peso = inner
            .pesos
            .get_mut(&peso_id)
            .filter(|p| p.stock == stock_id)
            .ok_or_else(|| AppError::NotFound("Peso".to_string()))?;

        if let Some(fecha) = changes.fecha {
            peso.fecha = fecha;
        }
        if let Some(value) = changes.peso {
            peso.peso = value;
        }
        if let Some(unidad) = changes.unidad {
            peso.unidad = unidad;
        }
        let peso = peso.clone();

        if let Some(stock) = inner.stocks.get_mut(&stock_id) {
            stock.updated_at = Utc::now();
        }
        Ok(peso)
    }

    /// Weight observations owned by a Stock, stored order (newest first).
    pub async fn pesos_for(&self, stock_id: Uuid) -> AppResult<Vec<Peso>> {
        let inner = self.read().await?;
        let stock = inner
            .stocks
            .get(&stock_id)
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;
        Ok(Self::resolved_pesos(&inner, stock))
    }

    /// Cascading bulk delete. Removes each Stock with its owned observations
    /// and nulls replenishment references on surviving Stocks that pointed at
    /// a removed id. Absent ids are skipped; returns the number of Stocks
    /// actually removed.
    pub async fn delete_stocks(&self, ids: &[Uuid]) -> AppResult<usize> {
        let mut guard = self.write().await?;
        let inner = &mut *guard;

        let mut removed = 0usize;
        for id in ids {
            if let Some(stock) = inner.stocks.remove(id) {
                for peso_id in &stock.pesos {
                    inner.pesos.remove(peso_id);
                }
                removed += 1;
            }
        }

        if removed > 0 {
            let live: HashSet<Uuid> = inner.stocks.keys().copied().collect();
            let now = Utc::now();
            for stock in inner.stocks.values_mut() {
                let mut touched = false;
                if let Some(target) = stock.compra.reposicion {
                    if !live.contains(&target) {
                        stock.compra.reposicion = None;
                        touched = true;
                    }
                }
                if let Some(venta) = stock.venta.as_mut() {
                    if let Some(target) = venta.reposicion {
                        if !live.contains(&target) {
                            venta.reposicion = None;
                            touched = true;
                        }
                    }
                }
                if touched {
                    stock.updated_at = now;
                }
            }
        }

        Ok(removed)
    }

    /// Distinct batch numbers, ascending. Feeds the filter form.
    pub async fn list_lote_nros(&self) -> AppResult<Vec<u32>> {
        let inner = self.read().await?;
        let mut lotes: Vec<u32> = inner
            .stocks
            .values()
            .map(|s| s.nro_lote)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        lotes.sort_unstable();
        Ok(lotes)
    }

    /// Stocks sold without a replenishment link, newest first. Feeds the
    /// purchase form's replenishment dropdown.
    pub async fn list_replenishment_candidates(&self) -> AppResult<Vec<Stock>> {
        let inner = self.read().await?;
        let mut candidates: Vec<Stock> = inner
            .stocks
            .values()
            .filter(|s| s.is_sold() && !s.is_replenished())
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(candidates)
    }
}
