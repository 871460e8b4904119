//! Shrinkage (merma): POS-recorded versus weight-derived consumption

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::period::is_active_during;
use super::rounding::{round_up_cents, sum_cents};
use super::volume::{consumption_by_period, BottleReading};
use super::{
    fan_out, measure_ingredient, measure_window, nothing_to_reconcile, EngineOptions,
    InventorySnapshot,
};
use crate::error::ReconciliationResult;
use crate::models::{Bottle, MermaRecord, ShrinkageReport};
use crate::types::{DateRange, PeriodGranularity, ReportStatus};
use crate::validation::validate_window;

/// Gap between what was sold and what left the bottles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shrinkage {
    pub merma: Decimal,
    pub percentage: Decimal,
}

/// Null-safe merma for one ingredient and period.
///
/// A zero POS figure with a known actual consumption reports -100% whatever
/// the size of the gap; it only exists to avoid dividing by zero.
pub fn calculate_merma(pos: Option<Decimal>, actual: Option<Decimal>) -> Shrinkage {
    match (pos, actual) {
        (None, None) => Shrinkage {
            merma: Decimal::ZERO,
            percentage: Decimal::ZERO,
        },
        (None, Some(actual)) => Shrinkage {
            merma: Decimal::ZERO - actual,
            percentage: -Decimal::ONE_HUNDRED,
        },
        (Some(pos), None) => Shrinkage {
            merma: pos,
            percentage: Decimal::ONE_HUNDRED,
        },
        (Some(pos), Some(actual)) if pos.is_zero() => Shrinkage {
            merma: pos - actual,
            percentage: -Decimal::ONE_HUNDRED,
        },
        (Some(pos), Some(actual)) => {
            let merma = pos - actual;
            Shrinkage {
                merma,
                percentage: round_up_cents(merma / pos * Decimal::ONE_HUNDRED),
            }
        }
    }
}

/// One bottle's window consumption, cut along the report periods
struct BottleShare<'a> {
    bottle: &'a Bottle,
    ingredient_id: Uuid,
    parts: Vec<Decimal>,
}

/// One ingredient in one period, before the catalog lookup
struct PeriodConsumption {
    period: DateRange,
    ingredient_id: Uuid,
    pos: Option<Decimal>,
    actual: Option<Decimal>,
}

/// Consumption figures of every ingredient seen in the period at `index`.
///
/// A bottle counts towards a period while it is alive in it, or when part of
/// its consumption was booked there.
fn consumption_in_period(
    snapshot: &InventorySnapshot,
    shares: &[BottleShare<'_>],
    index: usize,
    period: DateRange,
    ingredient_filter: Option<Uuid>,
) -> Vec<PeriodConsumption> {
    let mut actual: BTreeMap<Uuid, Vec<Decimal>> = BTreeMap::new();
    for share in shares {
        let part = share.parts.get(index).copied().unwrap_or_default();
        if !part.is_zero() || is_active_during(share.bottle, &period) {
            actual.entry(share.ingredient_id).or_default().push(part);
        }
    }

    let mut pos: BTreeMap<Uuid, Vec<Decimal>> = BTreeMap::new();
    for sale in snapshot
        .pos_consumption
        .iter()
        .filter(|sale| period.encloses(&sale.period))
    {
        pos.entry(sale.ingredient_id).or_default().push(sale.consumed_ml);
    }

    let ingredients: BTreeSet<Uuid> = actual
        .keys()
        .chain(pos.keys())
        .copied()
        .filter(|id| ingredient_filter.map_or(true, |wanted| wanted == *id))
        .collect();

    ingredients
        .into_iter()
        .map(|ingredient_id| PeriodConsumption {
            period,
            ingredient_id,
            pos: pos.remove(&ingredient_id).map(sum_cents),
            actual: actual.remove(&ingredient_id).map(sum_cents),
        })
        .collect()
}

/// Cut every measured bottle's consumption along `periods`
fn bottle_shares<'a>(
    snapshot: &'a InventorySnapshot,
    window: &DateRange,
    periods: &[DateRange],
    readings: &[BottleReading],
    options: &EngineOptions,
) -> ReconciliationResult<Vec<BottleShare<'a>>> {
    let by_bottle: HashMap<Uuid, &BottleReading> =
        readings.iter().map(|reading| (reading.bottle_id, reading)).collect();
    let measured: Vec<(&Bottle, &BottleReading)> = snapshot
        .bottles
        .iter()
        .filter_map(|bottle| by_bottle.get(&bottle.id).map(|reading| (bottle, *reading)))
        .collect();

    fan_out(measured, options, |(bottle, reading)| {
        Ok(BottleShare {
            bottle,
            ingredient_id: reading.ingredient_id,
            parts: consumption_by_period(
                bottle,
                snapshot.items_for(bottle.id),
                window,
                &reading.volume,
                reading.density,
                periods,
            ),
        })
    })
}

/// Build the shrinkage report for a branch over `window`.
///
/// The window is measured once and cut into periods by `granularity`; each
/// ingredient with either POS sales or a contributing bottle in a period
/// gets one record, and the actual consumption of a bottle is split across
/// periods so that per-period figures add up to the whole-window one. POS
/// aggregates count towards a period when their own period lies inside it.
///
/// With an ingredient filter only that ingredient's bottles are measured.
/// A scope with no inspected bottle is `no_data`.
pub fn shrinkage_report(
    snapshot: &InventorySnapshot,
    window: &DateRange,
    granularity: PeriodGranularity,
    ingredient_filter: Option<Uuid>,
    options: &EngineOptions,
) -> ReconciliationResult<ShrinkageReport> {
    validate_window(window)?;
    let readings = match ingredient_filter {
        Some(ingredient_id) => {
            snapshot.ingredient(ingredient_id)?;
            measure_ingredient(snapshot, window, ingredient_id)?
        }
        None => measure_window(snapshot, window)?,
    };

    let mut records = Vec::new();
    if !nothing_to_reconcile(&readings) {
        let periods = window.split(granularity);
        let shares = bottle_shares(snapshot, window, &periods, &readings, options)?;

        let indexed: Vec<(usize, DateRange)> = periods.iter().copied().enumerate().collect();
        let groups = fan_out(indexed, options, |(index, period)| {
            Ok(consumption_in_period(
                snapshot,
                &shares,
                index,
                period,
                ingredient_filter,
            ))
        })?;

        let consumption: Vec<PeriodConsumption> = groups.into_iter().flatten().collect();
        records = fan_out(consumption, options, |group| {
            let ingredient = snapshot.ingredient(group.ingredient_id)?;
            let shrinkage = calculate_merma(group.pos, group.actual);
            Ok(MermaRecord {
                ingredient_id: ingredient.id,
                ingredient: ingredient.name.clone(),
                category: ingredient.category.clone(),
                period_date: group.period.start,
                period_start: group.period.start,
                period_end: group.period.end,
                pos_consumption: group.pos,
                actual_consumption: group.actual,
                merma: shrinkage.merma,
                percentage: shrinkage.percentage,
            })
        })?;
    }

    records.sort_by(|a, b| {
        a.period_start
            .cmp(&b.period_start)
            .then_with(|| a.ingredient.cmp(&b.ingredient))
            .then_with(|| a.ingredient_id.cmp(&b.ingredient_id))
    });

    let status = if records.is_empty() {
        ReportStatus::NoData
    } else {
        ReportStatus::Success
    };

    tracing::info!(
        branch = %snapshot.branch.name,
        start = %window.start,
        end = %window.end,
        granularity = granularity.as_str(),
        bottles = readings.len(),
        records = records.len(),
        "Built shrinkage report"
    );

    Ok(ShrinkageReport {
        status,
        branch: snapshot.branch.name.clone(),
        period_start: window.start,
        period_end: window.end,
        records,
    })
}
