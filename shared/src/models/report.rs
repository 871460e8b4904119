//! Report payloads produced by the reconciliation engine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ReportStatus;

/// Purchase recommendation for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestockLineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub stock_ml: Decimal,
    pub demand_ml: Decimal,
    pub shortfall_ml: Decimal,
    pub suggested_units: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Restock report for a branch over a window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestockReport {
    pub status: ReportStatus,
    pub branch: String,
    pub report_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_cost: Decimal,
    pub line_items: Vec<RestockLineItem>,
}

/// Shrinkage of one ingredient over one period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MermaRecord {
    pub ingredient_id: Uuid,
    pub ingredient: String,
    pub category: String,
    /// Date the record is filed under (the period start)
    pub period_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Consumption according to POS sales
    pub pos_consumption: Option<Decimal>,
    /// Consumption according to bottle weights
    pub actual_consumption: Option<Decimal>,
    pub merma: Decimal,
    pub percentage: Decimal,
}

/// Shrinkage report for a branch over a window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShrinkageReport {
    pub status: ReportStatus,
    pub branch: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub records: Vec<MermaRecord>,
}
