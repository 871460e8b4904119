//! Bottle models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical bottle tracked by weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bottle {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Tax-authority stamp identifier
    pub folio: Option<String>,
    pub capacity_ml: i32,
    /// Mass of the empty bottle (grams)
    pub crystal_weight: Decimal,
    /// Mass at registration (grams)
    pub initial_weight: Decimal,
    /// Latest known mass (grams)
    pub current_weight: Decimal,
    pub registered_at: NaiveDate,
    pub removed_at: Option<NaiveDate>,
    pub state: BottleState,
}

/// Lifecycle state of a bottle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BottleState {
    New,
    WithLiquid,
    Empty,
    Lost,
}

impl BottleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleState::New => "NEW",
            BottleState::WithLiquid => "WITH_LIQUID",
            BottleState::Empty => "EMPTY",
            BottleState::Lost => "LOST",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(BottleState::New),
            "WITH_LIQUID" => Some(BottleState::WithLiquid),
            "EMPTY" => Some(BottleState::Empty),
            "LOST" => Some(BottleState::Lost),
            _ => None,
        }
    }

    /// Terminal states carry a `removed_at` stamp
    pub fn is_removed(&self) -> bool {
        matches!(self, BottleState::Empty | BottleState::Lost)
    }
}

impl std::fmt::Display for BottleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
