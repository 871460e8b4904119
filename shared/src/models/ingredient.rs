//! Ingredient models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReconciliationError, ReconciliationResult};

/// A liquor as it appears in recipes (e.g. "Tequila Blanco")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Weight-to-volume factor, typically between 0.90 and 1.10
    pub density_factor: Option<Decimal>,
}

impl Ingredient {
    /// Density factor, required by every volume conversion
    pub fn required_density_factor(&self) -> ReconciliationResult<Decimal> {
        let factor = self
            .density_factor
            .ok_or(ReconciliationError::MissingField {
                entity: "Ingredient",
                id: self.id,
                field: "density_factor",
            })?;

        crate::validation::validate_density_factor(factor).map_err(|reason| {
            ReconciliationError::InvalidField {
                entity: "Ingredient",
                id: self.id,
                field: "density_factor",
                reason: reason.to_string(),
            }
        })?;

        Ok(factor)
    }
}
