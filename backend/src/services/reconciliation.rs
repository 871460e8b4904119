//! Report runs: snapshot load plus engine compute under one deadline

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use shared::reconciliation::{self, CancelToken, EngineOptions, InventorySnapshot};
use shared::{
    validate_window, DateRange, PeriodGranularity, ReconciliationResult, RestockReport,
    ShrinkageReport,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ReportsConfig;
use crate::error::{AppError, AppResult};
use crate::services::SnapshotLoader;

/// Service producing restock and shrinkage reports for a branch
#[derive(Clone)]
pub struct ReconciliationService {
    loader: SnapshotLoader,
    reports: ReportsConfig,
}

impl ReconciliationService {
    pub fn new(db: PgPool, reports: ReportsConfig) -> Self {
        Self {
            loader: SnapshotLoader::new(db),
            reports,
        }
    }

    /// Restock recommendations for the branch over `window`
    pub async fn restock_report(
        &self,
        branch_id: Uuid,
        window: DateRange,
        report_date: NaiveDate,
        timeout: Option<Duration>,
    ) -> AppResult<RestockReport> {
        self.run(branch_id, window, None, timeout, move |snapshot, options| {
            reconciliation::restock_report(snapshot, &window, report_date, options)
        })
        .await
    }

    /// Shrinkage (merma) records for the branch over `window`
    pub async fn shrinkage_report(
        &self,
        branch_id: Uuid,
        window: DateRange,
        granularity: PeriodGranularity,
        ingredient_id: Option<Uuid>,
        timeout: Option<Duration>,
    ) -> AppResult<ShrinkageReport> {
        self.run(
            branch_id,
            window,
            ingredient_id,
            timeout,
            move |snapshot, options| {
                reconciliation::shrinkage_report(
                    snapshot,
                    &window,
                    granularity,
                    ingredient_id,
                    options,
                )
            },
        )
        .await
    }

    async fn run<T, F>(
        &self,
        branch_id: Uuid,
        window: DateRange,
        extra_ingredient: Option<Uuid>,
        timeout: Option<Duration>,
        compute: F,
    ) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&InventorySnapshot, &EngineOptions) -> ReconciliationResult<T> + Send + 'static,
    {
        validate_window(&window)?;

        let deadline = self.reports.effective_timeout(timeout);
        let options = self.reports.engine_options();
        let cancel = options.cancel.clone();
        let loader = self.loader.clone();

        with_deadline(deadline, &cancel, async move {
            let snapshot = loader.load(branch_id, &window, extra_ingredient).await?;

            for (bottle_id, reason) in snapshot.lifecycle_violations() {
                tracing::warn!(
                    branch_id = %branch_id,
                    bottle_id = %bottle_id,
                    reason,
                    "Bottle violates lifecycle invariants"
                );
            }

            // Compute is CPU-bound; keep it off the async workers
            let report = tokio::task::spawn_blocking(move || compute(&snapshot, &options))
                .await
                .map_err(|e| AppError::Internal(format!("Report task failed: {}", e)))??;

            Ok(report)
        })
        .await
    }
}

/// Run `fut` to completion or fail with [`AppError::Timeout`].
///
/// On timeout `cancel` is set, so a compute task already on the blocking
/// pool stops at its next group instead of running to the end.
pub async fn with_deadline<T, F>(deadline: Duration, cancel: &CancelToken, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(deadline_ms = deadline.as_millis() as u64, "Report deadline exceeded");
            Err(AppError::Timeout(deadline.as_millis()))
        }
    }
}
