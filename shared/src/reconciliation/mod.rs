//! Inventory reconciliation engine
//!
//! Pipeline, in dependency order:
//! 1. [`period`] picks the bottles alive during the window
//! 2. [`starting_weight`] reconstructs each bottle's weight at window start
//! 3. [`volume`] converts weights into consumed and remaining volume
//! 4. [`restock`] rolls bottles up into purchase recommendations
//! 5. [`merma`] compares POS consumption against weight-derived consumption
//!
//! Every step is pure over an [`InventorySnapshot`]; independent runs share
//! no state and can execute concurrently.

pub mod merma;
pub mod period;
pub mod restock;
pub mod rounding;
pub mod snapshot;
pub mod starting_weight;
pub mod volume;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ReconciliationError, ReconciliationResult};
use crate::models::Product;
use crate::types::DateRange;
use crate::validation::validate_window;

pub use merma::{calculate_merma, shrinkage_report, Shrinkage};
pub use period::{is_active_during, select_bottles};
pub use restock::{restock_report, suggested_units, ProductTotals, IVA_RATE};
pub use rounding::{mul_cents, round_up_cents, sum_cents};
pub use snapshot::InventorySnapshot;
pub use starting_weight::{History, InspectionSummary, StartingWeight};
pub use volume::{consumption_by_period, density, BottleReading, BottleVolume};

/// Flag shared with a running report; once set, remaining groups are skipped
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tuning knobs for a report run
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Group count at which per-product / per-ingredient work moves onto the
    /// rayon pool
    pub parallel_threshold: usize,
    pub cancel: CancelToken,
}

impl EngineOptions {
    pub fn with_threshold(parallel_threshold: usize) -> Self {
        Self {
            parallel_threshold,
            ..Self::default()
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: 16,
            cancel: CancelToken::new(),
        }
    }
}

/// Resolve and convert every bottle alive during `window`.
///
/// Fails fast when a bottle points at a missing product or ingredient, or
/// when the ingredient lacks a usable density factor.
pub fn measure_window(
    snapshot: &InventorySnapshot,
    window: &DateRange,
) -> ReconciliationResult<Vec<BottleReading>> {
    measure_selected(snapshot, window, |_| true)
}

/// [`measure_window`] restricted to the bottles of one ingredient.
///
/// Catalog data of other ingredients is never read.
pub fn measure_ingredient(
    snapshot: &InventorySnapshot,
    window: &DateRange,
    ingredient_id: Uuid,
) -> ReconciliationResult<Vec<BottleReading>> {
    measure_selected(snapshot, window, |product| product.ingredient_id == ingredient_id)
}

fn measure_selected<P>(
    snapshot: &InventorySnapshot,
    window: &DateRange,
    keep: P,
) -> ReconciliationResult<Vec<BottleReading>>
where
    P: Fn(&Product) -> bool,
{
    validate_window(window)?;

    let bottles = select_bottles(&snapshot.bottles, window);
    let mut densities: HashMap<Uuid, Decimal> = HashMap::new();
    let mut rule_counts = [0usize; 7];
    let mut readings = Vec::with_capacity(bottles.len());

    for bottle in bottles {
        let product = snapshot.product(bottle.product_id)?;
        if !keep(product) {
            continue;
        }
        let ingredient_density = match densities.get(&product.ingredient_id) {
            Some(cached) => *cached,
            None => {
                let computed = density(snapshot.ingredient(product.ingredient_id)?)?;
                densities.insert(product.ingredient_id, computed);
                computed
            }
        };

        let summary = InspectionSummary::from_items(snapshot.items_for(bottle.id), window);
        let starting_weight = StartingWeight::resolve(&summary);
        rule_counts[usize::from(starting_weight.rule_number() - 1)] += 1;

        readings.push(BottleReading {
            bottle_id: bottle.id,
            product_id: bottle.product_id,
            ingredient_id: product.ingredient_id,
            starting_weight,
            density: ingredient_density,
            volume: BottleVolume::compute(
                bottle,
                starting_weight.weight_for(bottle),
                ingredient_density,
            ),
        });
    }

    tracing::debug!(
        branch = %snapshot.branch.name,
        start = %window.start,
        end = %window.end,
        bottles = readings.len(),
        ?rule_counts,
        "Resolved starting weights"
    );

    Ok(readings)
}

/// True when no in-scope bottle has a single inspection on record.
///
/// Such a scope carries no measurements, so reports built on it are
/// `no_data` rather than a zero-valued success.
pub fn nothing_to_reconcile(readings: &[BottleReading]) -> bool {
    readings
        .iter()
        .all(|reading| reading.starting_weight == StartingWeight::NeverInspected)
}

/// Map `groups` through `f`, on the rayon pool once there are enough of them.
///
/// Output order always matches input order. The cancel token is checked
/// before each group.
pub(crate) fn fan_out<T, R, F>(
    groups: Vec<T>,
    options: &EngineOptions,
    f: F,
) -> ReconciliationResult<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> ReconciliationResult<R> + Send + Sync,
{
    let step = |group: T| {
        if options.cancel.is_cancelled() {
            return Err(ReconciliationError::Cancelled);
        }
        f(group)
    };

    if groups.len() >= options.parallel_threshold {
        groups.into_par_iter().map(step).collect()
    } else {
        groups.into_iter().map(step).collect()
    }
}
