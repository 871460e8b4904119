//! Product (bottle blueprint) models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReconciliationError, ReconciliationResult};

/// A purchasable presentation of an ingredient, e.g. "Tequila Blanco 700 ml"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub ingredient_id: Uuid,
    pub capacity_ml: Option<i32>,
    pub unit_price: Option<Decimal>,
}

impl Product {
    /// Bottle capacity in ml; must be present and positive
    pub fn required_capacity_ml(&self) -> ReconciliationResult<i32> {
        let capacity = self.capacity_ml.ok_or(ReconciliationError::MissingField {
            entity: "Product",
            id: self.id,
            field: "capacity_ml",
        })?;

        if capacity <= 0 {
            return Err(ReconciliationError::InvalidField {
                entity: "Product",
                id: self.id,
                field: "capacity_ml",
                reason: format!("capacity must be positive, got {}", capacity),
            });
        }

        Ok(capacity)
    }

    pub fn required_unit_price(&self) -> ReconciliationResult<Decimal> {
        self.unit_price.ok_or(ReconciliationError::MissingField {
            entity: "Product",
            id: self.id,
            field: "unit_price",
        })
    }
}
