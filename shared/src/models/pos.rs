//! Point-of-sale consumption aggregates

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DateRange;

/// Volume an ingredient should have lost according to POS sales
/// (recipe quantities times units sold) over a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosConsumption {
    pub ingredient_id: Uuid,
    pub period: DateRange,
    pub consumed_ml: Decimal,
}
