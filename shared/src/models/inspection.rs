//! Inspection (stock-check sweep) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point-in-time sweep over one storage location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: Uuid,
    pub location_id: Uuid,
    pub taken_at: DateTime<Utc>,
}

/// One bottle seen during an inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: Uuid,
    pub inspection_id: Uuid,
    pub bottle_id: Uuid,
    /// `None` means the bottle was present but not weighed this round
    pub measured_weight: Option<Decimal>,
    pub measured_at: DateTime<Utc>,
}

impl InspectionItem {
    pub fn is_weighed(&self) -> bool {
        self.measured_weight.is_some()
    }
}
