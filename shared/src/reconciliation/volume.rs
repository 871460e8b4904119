//! Weight to volume conversion

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::rounding::{mul_cents, round_up_cents};
use super::starting_weight::StartingWeight;
use crate::error::ReconciliationResult;
use crate::models::{Bottle, Ingredient, InspectionItem};
use crate::types::DateRange;

/// Grams to millilitres multiplier for an ingredient.
///
/// The `2 - factor` form is the business conversion law; it is not the
/// physical inverse of the density factor and must not be "corrected".
pub fn density(ingredient: &Ingredient) -> ReconciliationResult<Decimal> {
    let factor = ingredient.required_density_factor()?;
    Ok(Decimal::TWO - factor)
}

/// Volumes derived from one bottle's weights over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BottleVolume {
    pub starting_weight: Decimal,
    pub weight_delta: Decimal,
    pub consumed_ml: Decimal,
    pub current_ml: Decimal,
    pub shortfall_ml: Decimal,
}

impl BottleVolume {
    pub fn compute(bottle: &Bottle, starting_weight: Decimal, density: Decimal) -> Self {
        let weight_delta = starting_weight - bottle.current_weight;
        let consumed_ml = mul_cents(weight_delta, density);
        let current_ml = mul_cents(bottle.current_weight - bottle.crystal_weight, density);

        Self {
            starting_weight,
            weight_delta,
            consumed_ml,
            current_ml,
            shortfall_ml: round_up_cents(consumed_ml - current_ml),
        }
    }
}

/// Everything the engine knows about one in-scope bottle
#[derive(Debug, Clone, Serialize)]
pub struct BottleReading {
    pub bottle_id: Uuid,
    pub product_id: Uuid,
    pub ingredient_id: Uuid,
    pub starting_weight: StartingWeight,
    /// Grams to millilitres multiplier used for `volume`
    pub density: Decimal,
    pub volume: BottleVolume,
}

/// Split a bottle's window consumption over consecutive `periods`.
///
/// Liquid is booked on the date of the first in-window weighing that shows
/// it gone. Whatever no weighing accounts for lands on the day the bottle
/// was last seen: its removal date, or the window end. Each part is the
/// difference of two cent-rounded running totals, so when `periods` cover
/// `window` the parts add up to `volume.consumed_ml` exactly.
pub fn consumption_by_period(
    bottle: &Bottle,
    items: &[InspectionItem],
    window: &DateRange,
    volume: &BottleVolume,
    density: Decimal,
    periods: &[DateRange],
) -> Vec<Decimal> {
    let last_seen = bottle
        .removed_at
        .map_or(window.end, |removed| removed.min(window.end));

    let mut in_window: Vec<&InspectionItem> = items
        .iter()
        .filter(|item| window.contains_timestamp(item.measured_at))
        .filter(|item| item.measured_at.date_naive() <= last_seen)
        .collect();
    in_window.sort_by_key(|item| item.measured_at);

    let mut marks: Vec<(NaiveDate, Decimal)> = in_window
        .into_iter()
        .filter_map(|item| {
            item.measured_weight
                .map(|weight| (item.measured_at.date_naive(), weight))
        })
        .collect();
    marks.push((last_seen, bottle.current_weight));

    let consumed_by = |day: NaiveDate| {
        marks
            .iter()
            .take_while(|(on, _)| *on <= day)
            .last()
            .map_or(Decimal::ZERO, |(_, weight)| {
                mul_cents(volume.starting_weight - *weight, density)
            })
    };

    let mut booked = Decimal::ZERO;
    periods
        .iter()
        .map(|period| {
            let running = consumed_by(period.end);
            let part = running - booked;
            booked = running;
            part
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BottleState;
    use crate::types::PeriodGranularity;
    use crate::ReconciliationError;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ingredient(factor: Option<&str>) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "Tequila Blanco".to_string(),
            category: "Tequila".to_string(),
            density_factor: factor.map(dec),
        }
    }

    fn bottle(initial: &str, current: &str, crystal: &str) -> Bottle {
        Bottle {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            folio: None,
            capacity_ml: 700,
            crystal_weight: dec(crystal),
            initial_weight: dec(initial),
            current_weight: dec(current),
            registered_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            removed_at: None,
            state: BottleState::WithLiquid,
        }
    }

    #[test]
    fn test_density_is_two_minus_factor() {
        assert_eq!(density(&ingredient(Some("0.95"))).unwrap(), dec("1.05"));
        assert_eq!(density(&ingredient(Some("1.10"))).unwrap(), dec("0.90"));
    }

    #[test]
    fn test_density_requires_factor() {
        let ing = ingredient(None);
        let err = density(&ing).unwrap_err();
        assert_eq!(
            err,
            ReconciliationError::MissingField {
                entity: "Ingredient",
                id: ing.id,
                field: "density_factor",
            }
        );
    }

    #[test]
    fn test_density_rejects_out_of_range_factor() {
        let err = density(&ingredient(Some("2.5"))).unwrap_err();
        assert_eq!(err.field(), Some("density_factor"));
    }

    #[test]
    fn test_empty_bottle_volume() {
        let b = bottle("1165", "500", "500");
        let volume = BottleVolume::compute(&b, b.initial_weight, dec("1.05"));

        assert_eq!(volume.weight_delta, dec("665"));
        assert_eq!(volume.consumed_ml, dec("698.25"));
        assert_eq!(volume.current_ml, dec("0"));
        assert_eq!(volume.shortfall_ml, dec("698.25"));
    }

    #[test]
    fn test_partially_consumed_bottle() {
        let b = bottle("1200", "900", "450");
        let volume = BottleVolume::compute(&b, dec("1000"), dec("0.97"));

        assert_eq!(volume.weight_delta, dec("100"));
        assert_eq!(volume.consumed_ml, dec("97.00"));
        // (900 - 450) * 0.97 = 436.5
        assert_eq!(volume.current_ml, dec("436.50"));
        assert_eq!(volume.shortfall_ml, dec("-339.50"));
    }

    #[test]
    fn test_products_are_rounded_up_to_the_cent() {
        let b = bottle("1000", "999.333", "500");
        let volume = BottleVolume::compute(&b, b.initial_weight, dec("1.03"));
        // 0.667 * 1.03 = 0.68701
        assert_eq!(volume.consumed_ml, dec("0.69"));
        // 499.333 * 1.03 = 514.31299
        assert_eq!(volume.current_ml, dec("514.32"));
    }

    #[test]
    fn test_stationary_bottle_consumes_nothing() {
        let b = bottle("1165", "800", "500");
        let volume = BottleVolume::compute(&b, b.current_weight, dec("1.05"));
        assert_eq!(volume.consumed_ml, Decimal::ZERO);
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn weighed(b: &Bottle, day: u32, weight: Option<&str>) -> InspectionItem {
        InspectionItem {
            id: Uuid::new_v4(),
            inspection_id: Uuid::new_v4(),
            bottle_id: b.id,
            measured_weight: weight.map(dec),
            measured_at: date(day).and_hms_opt(21, 30, 0).unwrap().and_utc(),
        }
    }

    fn march() -> DateRange {
        DateRange::new(date(1), date(31))
    }

    /// Weighings on the 5th and 12th split 700 g of drop across three weeks
    #[test]
    fn test_consumption_follows_weighings() {
        let b = bottle("1200", "500", "500");
        let items = vec![
            weighed(&b, 12, Some("800")),
            weighed(&b, 5, Some("1100")),
            weighed(&b, 8, None),
        ];
        let volume = BottleVolume::compute(&b, b.initial_weight, dec("1.05"));
        let weeks = DateRange::new(date(1), date(21)).split(PeriodGranularity::Weekly);
        let window = DateRange::new(date(1), date(21));

        let parts = consumption_by_period(&b, &items, &window, &volume, dec("1.05"), &weeks);

        // 100 g by the 5th, 300 g more by the 12th, the last 300 g by the 21st
        assert_eq!(parts, vec![dec("105.00"), dec("315.00"), dec("315.00")]);
        assert_eq!(parts.iter().copied().sum::<Decimal>(), volume.consumed_ml);
    }

    /// Without weighings everything lands on the removal date
    #[test]
    fn test_unweighed_consumption_lands_on_removal() {
        let mut b = bottle("1165", "500", "500");
        b.removed_at = Some(date(10));
        let volume = BottleVolume::compute(&b, b.initial_weight, dec("1.05"));
        let weeks = march().split(PeriodGranularity::Weekly);

        let parts = consumption_by_period(&b, &[], &march(), &volume, dec("1.05"), &weeks);

        assert_eq!(parts.len(), weeks.len());
        assert_eq!(parts[0], Decimal::ZERO);
        assert_eq!(parts[1], dec("698.25"));
        assert!(parts[2..].iter().all(|part| part.is_zero()));
    }

    /// Daily parts of cent-rounded products still add up to the whole
    #[test]
    fn test_daily_parts_sum_to_whole() {
        let b = bottle("1000", "612.345", "450");
        let items: Vec<InspectionItem> = [
            (3, "987.111"),
            (9, "901.009"),
            (17, "777.777"),
            (25, "640.001"),
        ]
        .iter()
        .map(|(day, weight)| weighed(&b, *day, Some(*weight)))
        .collect();
        let volume = BottleVolume::compute(&b, dec("995.5"), dec("1.03"));
        let days = march().split(PeriodGranularity::Daily);

        let parts = consumption_by_period(&b, &items, &march(), &volume, dec("1.03"), &days);

        assert_eq!(parts.len(), 31);
        assert_eq!(parts.iter().copied().sum::<Decimal>(), volume.consumed_ml);
    }

    #[test]
    fn test_stationary_bottle_books_nothing() {
        let b = bottle("1165", "800", "500");
        let volume = BottleVolume::compute(&b, b.current_weight, dec("1.05"));
        let days = march().split(PeriodGranularity::Daily);

        let parts = consumption_by_period(&b, &[], &march(), &volume, dec("1.05"), &days);
        assert!(parts.iter().all(|part| part.is_zero()));
    }
}
