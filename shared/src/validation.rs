//! Validation utilities for the Livestock Stock Management Platform
//!
//! Field bounds mirror the entry forms the data originates from.

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ============================================================================
// Stock Field Validations
// ============================================================================

/// Minimum accepted weight for any observation, in the entered unit
pub const MIN_PESO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Minimum accepted price per kg
pub const MIN_PRECIO: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Validate the user-entered animal number/tag
pub fn validate_nro_stock(nro_stock: &str) -> Result<(), &'static str> {
    if nro_stock.trim().is_empty() {
        return Err("Cattle number is required");
    }
    Ok(())
}

/// Validate the batch number (integer >= 1)
pub fn validate_nro_lote(nro_lote: u32) -> Result<(), &'static str> {
    if nro_lote < 1 {
        return Err("Batch number must be at least 1");
    }
    Ok(())
}

/// Validate a weight observation value (>= 0.5 in its entered unit)
pub fn validate_peso(peso: Decimal) -> Result<(), &'static str> {
    if peso < MIN_PESO {
        return Err("Weight must be at least 0.5");
    }
    Ok(())
}

/// Validate a per-kg price (>= 0.1)
pub fn validate_precio(precio: Decimal) -> Result<(), &'static str> {
    if precio < MIN_PRECIO {
        return Err("Price per weight must be at least 0.1");
    }
    Ok(())
}

/// Validate that a sale date does not precede the purchase date. Keeps the
/// elapsed-days metric non-negative.
pub fn validate_fecha_venta(
    fecha_compra: NaiveDate,
    fecha_venta: NaiveDate,
) -> Result<(), &'static str> {
    if fecha_venta < fecha_compra {
        return Err("Sale date cannot precede the purchase date");
    }
    Ok(())
}

// ============================================================================
// Cattle Types
// ============================================================================

/// Accepted cattle-type labels. Descriptive tags, no behavioral branching.
pub const CATTLE_TYPES: &[&str] = &[
    "Holstein Friesian",
    "Hereford",
    "Simmental",
    "Aberdeen Angus",
    "Belgian Blue",
    "Limousin",
    "Brangus",
    "Red Angus",
    "Braford",
    "Belted Galloway",
    "Brown Swiss",
    "Beefalo",
    "Other",
];

/// Validate a cattle-type label against the accepted list
pub fn validate_tipo_stock(tipo: &str) -> Result<(), &'static str> {
    if CATTLE_TYPES.iter().any(|t| *t == tipo) {
        Ok(())
    } else {
        Err("Unknown cattle type")
    }
}
