//! Restock and merma report handlers

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{DateRange, PeriodGranularity};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{RestockReport, ShrinkageReport};
use crate::services::ReconciliationService;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RestockQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Defaults to today (UTC)
    pub report_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 600000))]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MermaQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ingredient_id: Option<Uuid>,
    pub granularity: Option<String>, // "whole", "daily", "weekly", "monthly"
    #[validate(range(min = 1, max = 600000))]
    pub timeout_ms: Option<u64>,
}

impl RestockQuery {
    fn window(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

impl MermaQuery {
    fn window(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    fn granularity(&self) -> AppResult<PeriodGranularity> {
        match self.granularity.as_deref() {
            None => Ok(PeriodGranularity::default()),
            Some(raw) => PeriodGranularity::from_str(raw).ok_or_else(|| AppError::Validation {
                field: "granularity".to_string(),
                message: format!("Unknown granularity: {}", raw),
                message_es: format!("Granularidad desconocida: {}", raw),
            }),
        }
    }
}

fn check<Q: Validate>(query: &Q) -> AppResult<()> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))
}

/// Get restock recommendations for a branch
pub async fn get_restock_report(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
    Query(query): Query<RestockQuery>,
) -> AppResult<Json<RestockReport>> {
    check(&query)?;

    let service = ReconciliationService::new(state.db.clone(), state.config.reports.clone());
    let report = service
        .restock_report(
            branch_id,
            query.window(),
            query.report_date.unwrap_or_else(|| Utc::now().date_naive()),
            query.timeout_ms.map(Duration::from_millis),
        )
        .await?;

    Ok(Json(report))
}

/// Get the shrinkage (merma) report for a branch
pub async fn get_merma_report(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
    Query(query): Query<MermaQuery>,
) -> AppResult<Json<ShrinkageReport>> {
    check(&query)?;
    let granularity = query.granularity()?;

    let service = ReconciliationService::new(state.db.clone(), state.config.reports.clone());
    let report = service
        .shrinkage_report(
            branch_id,
            query.window(),
            granularity,
            query.ingredient_id,
            query.timeout_ms.map(Duration::from_millis),
        )
        .await?;

    Ok(Json(report))
}
