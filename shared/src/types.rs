//! Common value types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Weight unit of a single observation. All derived arithmetic is done on
/// kg-normalized values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
    Grm,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
            WeightUnit::Grm => "grm",
        }
    }

    /// Normalize a weight expressed in this unit to kilograms.
    pub fn to_kg(&self, value: Decimal) -> Decimal {
        match self {
            WeightUnit::Kg => value,
            // 1 lb = 0.453592 kg
            WeightUnit::Lb => value * Decimal::new(453_592, 6),
            // 1 grm = 0.001 kg
            WeightUnit::Grm => value * Decimal::new(1, 3),
        }
    }
}

/// Purpose of a weight observation. Determines display grouping only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PesoTipo {
    Compra,
    Venta,
    #[default]
    Control,
}

impl PesoTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            PesoTipo::Compra => "compra",
            PesoTipo::Venta => "venta",
            PesoTipo::Control => "control",
        }
    }
}

/// Sold-status buckets used by the filter engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SoldStatus {
    /// Sold, proceeds replenished by a later purchase
    Vendido,
    /// Sold without a replenishment link
    Sinreponer,
    /// Not sold
    Sinvender,
    /// Marked lost/death
    Perdida,
}

impl SoldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoldStatus::Vendido => "vendido",
            SoldStatus::Sinreponer => "sinreponer",
            SoldStatus::Sinvender => "sinvender",
            SoldStatus::Perdida => "perdida",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "vendido" => Some(SoldStatus::Vendido),
            "sinreponer" => Some(SoldStatus::Sinreponer),
            "sinvender" => Some(SoldStatus::Sinvender),
            "perdida" => Some(SoldStatus::Perdida),
            _ => None,
        }
    }
}
