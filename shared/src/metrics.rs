//! Derived metrics computed on read from a Stock and its weight history
//!
//! Nothing here is persisted: totals, profit, elapsed days and averages are
//! recomputed from the raw records on every read. Intermediates stay exact
//! `Decimal`s; rounding to two decimal places happens only in
//! [`StockMetrics::rounded_for_display`].

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Peso, Stock};

/// Derived financial and temporal metrics for one Stock.
///
/// Sale-dependent fields are `None` until a sale is recorded and are omitted
/// from the serialized form, so an unsold Stock never surfaces a bogus number.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMetrics {
    pub total_precio_compra: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_precio_venta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dias_transcurridos: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peso_promedio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_peso: Option<Peso>,
}

/// Compute all derived metrics for `stock` from its resolved weight history.
///
/// `pesos` is the Stock's owned observations in stored order: most recently
/// inserted first. A missing referenced observation contributes zero rather
/// than failing the whole computation.
pub fn compute_metrics(stock: &Stock, pesos: &[Peso]) -> StockMetrics {
    let resolve = |id| pesos.iter().find(|p: &&Peso| p.id == id);

    let total_precio_compra = resolve(stock.compra.peso)
        .map(|p| p.peso_kg() * stock.compra.precio)
        .unwrap_or(Decimal::ZERO);

    let (total_precio_venta, profit, dias_transcurridos) = match &stock.venta {
        Some(venta) => {
            let total_venta = resolve(venta.peso)
                .map(|p| p.peso_kg() * venta.precio)
                .unwrap_or(Decimal::ZERO);
            (
                Some(total_venta),
                Some(total_venta - total_precio_compra),
                Some((venta.fecha - stock.compra.fecha).num_days()),
            )
        }
        None => (None, None, None),
    };

    StockMetrics {
        total_precio_compra,
        total_precio_venta,
        profit,
        dias_transcurridos,
        peso_promedio: peso_promedio(pesos),
        last_peso: last_peso(pesos).cloned(),
    }
}

/// Arithmetic mean of all observations, kg-normalized. `None` for an empty
/// history.
pub fn peso_promedio(pesos: &[Peso]) -> Option<Decimal> {
    if pesos.is_empty() {
        return None;
    }
    let total: Decimal = pesos.iter().map(Peso::peso_kg).sum();
    Some(total / Decimal::from(pesos.len() as u64))
}

/// The observation with the most recent date. Ties go to the most recently
/// inserted observation, which is the earliest element of the stored
/// (newest-first) sequence.
pub fn last_peso(pesos: &[Peso]) -> Option<&Peso> {
    pesos
        .iter()
        .fold(None, |best: Option<&Peso>, p| match best {
            Some(b) if b.fecha >= p.fecha => Some(b),
            _ => Some(p),
        })
}

impl StockMetrics {
    /// Presentation form: monetary values and the average rounded to two
    /// decimal places. Raw metrics stay exact so chained computations never
    /// compound rounding error.
    pub fn rounded_for_display(&self) -> StockMetrics {
        StockMetrics {
            total_precio_compra: self.total_precio_compra.round_dp(2),
            total_precio_venta: self.total_precio_venta.map(|d| d.round_dp(2)),
            profit: self.profit.map(|d| d.round_dp(2)),
            dias_transcurridos: self.dias_transcurridos,
            peso_promedio: self.peso_promedio.map(|d| d.round_dp(2)),
            last_peso: self.last_peso.clone(),
        }
    }
}
