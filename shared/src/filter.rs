//! Query/filter engine for Stock listings
//!
//! Two shapes: [`StockFilterParams`] is what arrives on the wire, where every
//! field is optional and an empty string is a sentinel for "no constraint".
//! [`StockFilter`] is the normalized, strongly-typed form the predicate runs
//! on. Normalization happens once at the boundary so comparison logic never
//! sees a sentinel.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{Peso, Stock};
use crate::types::SoldStatus;

/// Weight-range slider bounds in the filter form. A submitted range equal to
/// the full span means "no constraint".
pub const PESO_RANGE_MIN: u32 = 0;
pub const PESO_RANGE_MAX: u32 = 600;

/// Raw filter fields as sent by the client (query string / form state).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockFilterParams {
    /// Free-text search against the serial
    pub buscar: Option<String>,
    pub lote_nro: Option<String>,
    pub tipo_stock: Option<String>,
    pub vendido: Option<String>,
    pub fecha_compra1: Option<String>,
    pub fecha_compra2: Option<String>,
    pub fecha_venta1: Option<String>,
    pub fecha_venta2: Option<String>,
    pub peso1: Option<String>,
    pub peso2: Option<String>,
}

/// Normalized filter specification. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockFilter {
    pub buscar: Option<String>,
    pub lote_nro: Option<u32>,
    pub tipo_stock: Option<String>,
    pub vendido: Option<SoldStatus>,
    pub fecha_compra1: Option<NaiveDate>,
    pub fecha_compra2: Option<NaiveDate>,
    pub fecha_venta1: Option<NaiveDate>,
    pub fecha_venta2: Option<NaiveDate>,
    pub peso1: Option<Decimal>,
    pub peso2: Option<Decimal>,
}

impl StockFilterParams {
    /// Convert the raw wire shape into the typed filter, dropping empty-string
    /// sentinels, unparseable values and full-span weight bounds.
    pub fn normalize(&self) -> StockFilter {
        StockFilter {
            buscar: non_empty(&self.buscar),
            lote_nro: non_empty(&self.lote_nro).and_then(|s| s.parse().ok()),
            tipo_stock: non_empty(&self.tipo_stock),
            vendido: non_empty(&self.vendido).and_then(|s| SoldStatus::from_str(&s)),
            fecha_compra1: parse_fecha(&self.fecha_compra1),
            fecha_compra2: parse_fecha(&self.fecha_compra2),
            fecha_venta1: parse_fecha(&self.fecha_venta1),
            fecha_venta2: parse_fecha(&self.fecha_venta2),
            peso1: parse_peso_bound(&self.peso1, PESO_RANGE_MIN),
            peso2: parse_peso_bound(&self.peso2, PESO_RANGE_MAX),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts a plain date (`2023-01-10`) or an RFC 3339 timestamp, as the date
/// pickers serialize either depending on locale plumbing.
fn parse_fecha(value: &Option<String>) -> Option<NaiveDate> {
    let s = non_empty(value)?;
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.date_naive())
}

fn parse_peso_bound(value: &Option<String>, span_default: u32) -> Option<Decimal> {
    let bound: Decimal = non_empty(value)?.parse().ok()?;
    if bound == Decimal::from(span_default) {
        return None;
    }
    Some(bound)
}

impl StockFilter {
    /// True iff at least one field is set. Identical computation regardless of
    /// how many fields were supplied; an all-empty params object normalizes to
    /// an inactive filter.
    pub fn is_active(&self) -> bool {
        *self != StockFilter::default()
    }

    /// AND-composition of every present field over one Stock and its resolved
    /// weight history (stored order, newest first).
    pub fn matches(&self, stock: &Stock, pesos: &[Peso]) -> bool {
        if let Some(buscar) = &self.buscar {
            if !stock
                .serial_nro
                .to_lowercase()
                .contains(&buscar.to_lowercase())
            {
                return false;
            }
        }

        if let Some(lote) = self.lote_nro {
            if stock.nro_lote != lote {
                return false;
            }
        }

        if let Some(tipo) = &self.tipo_stock {
            if stock.tipo_stock != *tipo {
                return false;
            }
        }

        if let Some(status) = self.vendido {
            let matches_status = match status {
                SoldStatus::Vendido => stock.is_replenished(),
                SoldStatus::Sinreponer => stock.is_sold() && !stock.is_replenished(),
                SoldStatus::Sinvender => !stock.is_sold() && !stock.perdida,
                SoldStatus::Perdida => stock.perdida,
            };
            if !matches_status {
                return false;
            }
        }

        if let Some(desde) = self.fecha_compra1 {
            if stock.compra.fecha < desde {
                return false;
            }
        }
        if let Some(hasta) = self.fecha_compra2 {
            if stock.compra.fecha > hasta {
                return false;
            }
        }

        if self.fecha_venta1.is_some() || self.fecha_venta2.is_some() {
            let Some(venta) = &stock.venta else {
                return false;
            };
            if let Some(desde) = self.fecha_venta1 {
                if venta.fecha < desde {
                    return false;
                }
            }
            if let Some(hasta) = self.fecha_venta2 {
                if venta.fecha > hasta {
                    return false;
                }
            }
        }

        if self.peso1.is_some() || self.peso2.is_some() {
            let Some(entrada_kg) = pesos
                .iter()
                .find(|p| p.id == stock.compra.peso)
                .map(Peso::peso_kg)
            else {
                return false;
            };
            if let Some(min) = self.peso1 {
                if entrada_kg < min {
                    return false;
                }
            }
            if let Some(max) = self.peso2 {
                if entrada_kg > max {
                    return false;
                }
            }
        }

        true
    }
}
