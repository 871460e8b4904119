//! Errors raised by the reconciliation engine

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Reconciliation failures
///
/// Null weight readings and zero POS consumption are domain states and never
/// show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconciliationError {
    #[error("{entity} {id} is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        id: Uuid,
        field: &'static str,
    },

    #[error("{entity} {id} has an invalid `{field}`: {reason}")]
    InvalidField {
        entity: &'static str,
        id: Uuid,
        field: &'static str,
        reason: String,
    },

    #[error("Product {0} not found")]
    UnknownProduct(Uuid),

    #[error("Ingredient {0} not found")]
    UnknownIngredient(Uuid),

    #[error("Invalid reporting window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Report run was cancelled")]
    Cancelled,
}

impl ReconciliationError {
    /// Name of the offending field, if the error is about one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ReconciliationError::MissingField { field, .. }
            | ReconciliationError::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

pub type ReconciliationResult<T> = Result<T, ReconciliationError>;
