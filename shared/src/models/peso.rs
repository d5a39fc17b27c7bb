//! Peso: a single weight observation tied to a Stock

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{PesoTipo, WeightUnit};

/// One weight observation. Owned by exactly one Stock; immutable once created
/// except through the explicit edit path, removed only when its Stock is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peso {
    pub id: Uuid,
    /// Owning Stock
    pub stock: Uuid,
    pub fecha: NaiveDate,
    pub peso: Decimal,
    pub unidad: WeightUnit,
    pub tipo: PesoTipo,
    pub created_at: DateTime<Utc>,
}

impl Peso {
    /// The observed weight normalized to kilograms.
    pub fn peso_kg(&self) -> Decimal {
        self.unidad.to_kg(self.peso)
    }
}
