//! Restock aggregation: per-product shortfall, purchase quantity and cost

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::rounding::{mul_cents, round_up_cents, sum_cents};
use super::{
    fan_out, measure_window, nothing_to_reconcile, BottleReading, EngineOptions, InventorySnapshot,
};
use crate::error::{ReconciliationError, ReconciliationResult};
use crate::models::{Product, RestockLineItem, RestockReport};
use crate::types::{DateRange, ReportStatus};

/// Value added tax applied to every purchase line (16%)
pub const IVA_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

/// Summed volumes of every in-scope bottle of one product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTotals {
    pub stock_ml: Decimal,
    pub demand_ml: Decimal,
    pub shortfall_ml: Decimal,
}

impl ProductTotals {
    pub fn from_readings(readings: &[&BottleReading]) -> Self {
        Self {
            stock_ml: sum_cents(readings.iter().map(|r| r.volume.current_ml)),
            demand_ml: sum_cents(readings.iter().map(|r| r.volume.consumed_ml)),
            shortfall_ml: sum_cents(readings.iter().map(|r| r.volume.shortfall_ml)),
        }
    }

    /// Remaining stock already covers demand
    pub fn is_sufficient(&self) -> bool {
        self.shortfall_ml <= Decimal::ZERO
    }
}

/// Whole bottles needed to cover `shortfall_ml`
pub fn suggested_units(shortfall_ml: Decimal, capacity_ml: i32) -> Option<i64> {
    if capacity_ml <= 0 {
        return None;
    }
    (shortfall_ml / Decimal::from(capacity_ml)).ceil().to_i64()
}

/// Price a product whose stock does not cover demand
fn price_line(product: &Product, totals: ProductTotals) -> ReconciliationResult<RestockLineItem> {
    let capacity_ml = product.required_capacity_ml()?;
    let unit_price = product.required_unit_price()?;

    let units = suggested_units(totals.shortfall_ml, capacity_ml).ok_or_else(|| {
        ReconciliationError::InvalidField {
            entity: "Product",
            id: product.id,
            field: "capacity_ml",
            reason: format!("shortfall of {} ml is out of range", totals.shortfall_ml),
        }
    })?;

    let subtotal = mul_cents(Decimal::from(units), unit_price);
    let tax = mul_cents(subtotal, IVA_RATE);
    let total = round_up_cents(subtotal + tax);

    Ok(RestockLineItem {
        product_id: product.id,
        product_name: product.name.clone(),
        stock_ml: totals.stock_ml,
        demand_ml: totals.demand_ml,
        shortfall_ml: totals.shortfall_ml,
        suggested_units: units,
        unit_price,
        subtotal,
        tax,
        total,
    })
}

/// Build the restock report for a branch over `window`.
///
/// Products whose remaining stock covers their demand are left out. A
/// window without a single inspected bottle in scope reports `NoData`.
pub fn restock_report(
    snapshot: &InventorySnapshot,
    window: &DateRange,
    report_date: NaiveDate,
    options: &EngineOptions,
) -> ReconciliationResult<RestockReport> {
    let readings = measure_window(snapshot, window)?;

    if nothing_to_reconcile(&readings) {
        tracing::debug!(
            branch = %snapshot.branch.name,
            bottles = readings.len(),
            "No inspected bottle in scope"
        );
        return Ok(RestockReport {
            status: ReportStatus::NoData,
            branch: snapshot.branch.name.clone(),
            report_date,
            period_start: window.start,
            period_end: window.end,
            total_cost: Decimal::ZERO,
            line_items: Vec::new(),
        });
    }

    let mut by_product: BTreeMap<Uuid, Vec<&BottleReading>> = BTreeMap::new();
    for reading in &readings {
        by_product.entry(reading.product_id).or_default().push(reading);
    }

    let groups: Vec<(Uuid, Vec<&BottleReading>)> = by_product.into_iter().collect();
    let lines = fan_out(groups, options, |(product_id, group)| {
        let product = snapshot.product(product_id)?;
        let totals = ProductTotals::from_readings(&group);
        if totals.is_sufficient() {
            return Ok(None);
        }
        price_line(product, totals).map(Some)
    })?;

    let mut line_items: Vec<RestockLineItem> = lines.into_iter().flatten().collect();
    line_items.sort_by(|a, b| {
        b.suggested_units
            .cmp(&a.suggested_units)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });

    let total_cost = sum_cents(line_items.iter().map(|line| line.total));

    tracing::info!(
        branch = %snapshot.branch.name,
        start = %window.start,
        end = %window.end,
        bottles = readings.len(),
        lines = line_items.len(),
        %total_cost,
        "Built restock report"
    );

    Ok(RestockReport {
        status: ReportStatus::Success,
        branch: snapshot.branch.name.clone(),
        report_date,
        period_start: window.start,
        period_end: window.end,
        total_cost,
        line_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bottle, BottleState, Branch, Ingredient, InspectionItem};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> DateRange {
        DateRange::new(date(2024, 6, 1), date(2024, 6, 30))
    }

    fn ingredient(factor: &str) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "Ron Blanco".to_string(),
            category: "Ron".to_string(),
            density_factor: Some(dec(factor)),
        }
    }

    fn product(name: &str, ingredient: &Ingredient, capacity: i32, price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            ingredient_id: ingredient.id,
            capacity_ml: Some(capacity),
            unit_price: Some(dec(price)),
        }
    }

    fn bottle(product: &Product, initial: &str, current: &str, crystal: &str) -> Bottle {
        Bottle {
            id: Uuid::new_v4(),
            product_id: product.id,
            folio: None,
            capacity_ml: product.capacity_ml.unwrap_or_default(),
            crystal_weight: dec(crystal),
            initial_weight: dec(initial),
            current_weight: dec(current),
            registered_at: date(2024, 1, 1),
            removed_at: None,
            state: BottleState::WithLiquid,
        }
    }

    /// Adds the bottle with one unweighed check mid-window; a single
    /// in-window inspection keeps the registration weight as the start
    trait CheckedBottle {
        fn with_checked_bottle(self, bottle: Bottle) -> Self;
    }

    impl CheckedBottle for InventorySnapshot {
        fn with_checked_bottle(self, bottle: Bottle) -> Self {
            let item = InspectionItem {
                id: Uuid::new_v4(),
                inspection_id: Uuid::new_v4(),
                bottle_id: bottle.id,
                measured_weight: None,
                measured_at: date(2024, 6, 15).and_hms_opt(22, 0, 0).unwrap().and_utc(),
            };
            self.with_bottle(bottle).with_inspection_item(item)
        }
    }

    fn branch() -> Branch {
        Branch {
            id: Uuid::new_v4(),
            name: "Polanco".to_string(),
        }
    }

    #[test]
    fn test_iva_rate() {
        assert_eq!(IVA_RATE, dec("0.16"));
    }

    #[test]
    fn test_suggested_units_boundaries() {
        assert_eq!(suggested_units(dec("1400"), 700), Some(2));
        assert_eq!(suggested_units(dec("1400.01"), 700), Some(3));
        assert_eq!(suggested_units(dec("698.25"), 700), Some(1));
        assert_eq!(suggested_units(dec("0.01"), 700), Some(1));
        assert_eq!(suggested_units(dec("10"), 0), None);
    }

    #[test]
    fn test_empty_bottle_end_to_end() {
        let ing = ingredient("0.95");
        let prod = product("Ron Blanco 700", &ing, 700, "250.50");
        let b = bottle(&prod, "1165", "500", "500");
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_product(prod)
            .with_checked_bottle(b);

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();

        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.line_items.len(), 1);
        let line = &report.line_items[0];
        assert_eq!(line.stock_ml, dec("0"));
        assert_eq!(line.demand_ml, dec("698.25"));
        assert_eq!(line.shortfall_ml, dec("698.25"));
        assert_eq!(line.suggested_units, 1);
        assert_eq!(line.subtotal, dec("250.50"));
        // 250.50 * 0.16 = 40.08
        assert_eq!(line.tax, dec("40.08"));
        assert_eq!(line.total, dec("290.58"));
        assert_eq!(report.total_cost, dec("290.58"));
    }

    #[test]
    fn test_tax_rounds_up_to_the_cent() {
        let ing = ingredient("1.00");
        let prod = product("Ron Añejo 1000", &ing, 1000, "123.45");
        let b = bottle(&prod, "1500", "500", "500");
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_product(prod)
            .with_checked_bottle(b);

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();
        let line = &report.line_items[0];

        assert_eq!(line.suggested_units, 1);
        // 123.45 * 0.16 = 19.752
        assert_eq!(line.tax, dec("19.76"));
        assert_eq!(line.total, dec("143.21"));
    }

    #[test]
    fn test_sufficient_stock_is_skipped_but_report_succeeds() {
        let ing = ingredient("1.00");
        let prod = product("Vodka 750", &ing, 750, "200");
        // Weighed in window at 1200, now 1100: 100 ml consumed, 600 ml left
        let b = bottle(&prod, "1250", "1100", "500");
        let items = vec![
            InspectionItem {
                id: Uuid::new_v4(),
                inspection_id: Uuid::new_v4(),
                bottle_id: b.id,
                measured_weight: Some(dec("1230")),
                measured_at: date(2024, 5, 1).and_hms_opt(10, 0, 0).unwrap().and_utc(),
            },
            InspectionItem {
                id: Uuid::new_v4(),
                inspection_id: Uuid::new_v4(),
                bottle_id: b.id,
                measured_weight: Some(dec("1200")),
                measured_at: date(2024, 6, 2).and_hms_opt(10, 0, 0).unwrap().and_utc(),
            },
        ];
        let mut snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_product(prod)
            .with_bottle(b);
        for item in items {
            snapshot = snapshot.with_inspection_item(item);
        }

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();

        assert_eq!(report.status, ReportStatus::Success);
        assert!(report.line_items.is_empty());
        assert_eq!(report.total_cost, Decimal::ZERO);
    }

    #[test]
    fn test_no_bottles_in_scope_is_no_data() {
        let ing = ingredient("1.00");
        let prod = product("Gin 750", &ing, 750, "300");
        let mut b = bottle(&prod, "1200", "500", "500");
        b.registered_at = date(2024, 8, 1);
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_product(prod)
            .with_bottle(b);

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();

        assert_eq!(report.status, ReportStatus::NoData);
        assert!(report.line_items.is_empty());
    }

    #[test]
    fn test_uninspected_bottles_are_no_data() {
        let ing = ingredient("1.00");
        let prod = product("Gin 750", &ing, 750, "300");
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_bottle(bottle(&prod, "1200", "500", "500"))
            .with_product(prod);

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();

        assert_eq!(report.status, ReportStatus::NoData);
        assert!(report.line_items.is_empty());
        assert_eq!(report.total_cost, Decimal::ZERO);
    }

    #[test]
    fn test_lines_sorted_by_units_then_name() {
        let ing = ingredient("1.00");
        let small = product("B Small", &ing, 1000, "100");
        let big = product("Z Big", &ing, 500, "100");
        let tie = product("A Small", &ing, 1000, "100");
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_checked_bottle(bottle(&small, "1500", "500", "500"))
            .with_checked_bottle(bottle(&big, "1500", "500", "500"))
            .with_checked_bottle(bottle(&tie, "1500", "500", "500"))
            .with_product(small)
            .with_product(big)
            .with_product(tie);

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();
        let names: Vec<&str> = report.line_items.iter().map(|l| l.product_name.as_str()).collect();

        assert_eq!(names, vec!["Z Big", "A Small", "B Small"]);
        assert_eq!(report.line_items[0].suggested_units, 2);
        // 116 + 116 + 232
        assert_eq!(report.total_cost, dec("464"));
    }

    #[test]
    fn test_bottles_of_one_product_are_summed() {
        let ing = ingredient("1.00");
        let prod = product("Whisky 700", &ing, 700, "500");
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_checked_bottle(bottle(&prod, "1200", "500", "500"))
            .with_checked_bottle(bottle(&prod, "1200", "800", "500"))
            .with_product(prod);

        let report = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap();
        let line = &report.line_items[0];

        assert_eq!(line.stock_ml, dec("300"));
        assert_eq!(line.demand_ml, dec("1100"));
        assert_eq!(line.shortfall_ml, dec("800"));
        assert_eq!(line.suggested_units, 2);
    }

    #[test]
    fn test_missing_unit_price_fails_fast() {
        let ing = ingredient("1.00");
        let mut prod = product("Brandy 700", &ing, 700, "100");
        prod.unit_price = None;
        let prod_id = prod.id;
        let snapshot = InventorySnapshot::new(branch())
            .with_ingredient(ing)
            .with_checked_bottle(bottle(&prod, "1200", "500", "500"))
            .with_product(prod);

        let err = restock_report(&snapshot, &window(), date(2024, 7, 1), &EngineOptions::default()).unwrap_err();

        assert_eq!(
            err,
            ReconciliationError::MissingField {
                entity: "Product",
                id: prod_id,
                field: "unit_price",
            }
        );
    }

    #[test]
    fn test_parallel_and_sequential_reports_match() {
        let ing = ingredient("0.97");
        let mut snapshot = InventorySnapshot::new(branch()).with_ingredient(ing.clone());
        for i in 0..40 {
            let prod = product(&format!("Product {:02}", i), &ing, 700 + i, "199.99");
            let current = format!("{}", 500 + i * 7);
            snapshot = snapshot
                .with_checked_bottle(bottle(&prod, "1180", &current, "500"))
                .with_product(prod);
        }

        let sequential = restock_report(
            &snapshot,
            &window(),
            date(2024, 7, 1),
            &EngineOptions::with_threshold(usize::MAX),
        )
        .unwrap();
        let parallel = restock_report(
            &snapshot,
            &window(),
            date(2024, 7, 1),
            &EngineOptions::with_threshold(1),
        )
        .unwrap();

        assert_eq!(sequential, parallel);
    }
}
