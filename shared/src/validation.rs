//! Validation utilities for the liquor inventory platform
//!
//! Checks applied to snapshot data before it reaches the reconciliation
//! engine.

use rust_decimal::Decimal;

use crate::error::{ReconciliationError, ReconciliationResult};
use crate::models::Bottle;
use crate::types::DateRange;

// ============================================================================
// Reporting Window
// ============================================================================

/// Validate that a reporting window does not end before it starts
pub fn validate_window(window: &DateRange) -> ReconciliationResult<()> {
    if !window.is_valid() {
        return Err(ReconciliationError::InvalidWindow {
            start: window.start,
            end: window.end,
        });
    }
    Ok(())
}

// ============================================================================
// Ingredient / Bottle Validations
// ============================================================================

/// Validate a density factor; `2 - factor` must stay positive
pub fn validate_density_factor(factor: Decimal) -> Result<(), &'static str> {
    if factor <= Decimal::ZERO {
        return Err("Density factor must be positive");
    }
    if factor >= Decimal::TWO {
        return Err("Density factor must be below 2");
    }
    Ok(())
}

/// Validate a weight reading in grams
pub fn validate_weight(weight: Decimal) -> Result<(), &'static str> {
    if weight < Decimal::ZERO {
        return Err("Weight cannot be negative");
    }
    Ok(())
}

/// Validate the lifecycle invariants of a bottle
///
/// `removed_at` is stamped exactly when the bottle is EMPTY or LOST, removal
/// never precedes registration, and the bottle never gains liquid.
pub fn validate_bottle_lifecycle(bottle: &Bottle) -> Result<(), &'static str> {
    match (bottle.state.is_removed(), bottle.removed_at) {
        (true, None) => return Err("Removed bottle has no removal date"),
        (false, Some(_)) => return Err("Active bottle has a removal date"),
        _ => {}
    }

    if let Some(removed_at) = bottle.removed_at {
        if removed_at < bottle.registered_at {
            return Err("Bottle removed before it was registered");
        }
    }

    if bottle.current_weight > bottle.initial_weight {
        return Err("Current weight exceeds initial weight");
    }

    validate_weight(bottle.crystal_weight)?;
    validate_weight(bottle.current_weight)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BottleState;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bottle(state: BottleState, removed_at: Option<NaiveDate>) -> Bottle {
        Bottle {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            folio: Some("1234567890".to_string()),
            capacity_ml: 700,
            crystal_weight: dec("500"),
            initial_weight: dec("1165"),
            current_weight: dec("900"),
            registered_at: date(2024, 1, 1),
            removed_at,
            state,
        }
    }

    #[test]
    fn test_validate_window() {
        assert!(validate_window(&DateRange::new(date(2024, 1, 1), date(2024, 1, 31))).is_ok());
        assert!(validate_window(&DateRange::day(date(2024, 1, 1))).is_ok());

        let err = validate_window(&DateRange::new(date(2024, 2, 1), date(2024, 1, 1))).unwrap_err();
        assert!(matches!(err, ReconciliationError::InvalidWindow { .. }));
    }

    #[test]
    fn test_validate_density_factor() {
        assert!(validate_density_factor(dec("0.95")).is_ok());
        assert!(validate_density_factor(dec("1.10")).is_ok());
        assert!(validate_density_factor(dec("0")).is_err());
        assert!(validate_density_factor(dec("-0.5")).is_err());
        assert!(validate_density_factor(dec("2")).is_err());
    }

    #[test]
    fn test_validate_weight() {
        assert!(validate_weight(dec("0")).is_ok());
        assert!(validate_weight(dec("1165.5")).is_ok());
        assert!(validate_weight(dec("-1")).is_err());
    }

    #[test]
    fn test_bottle_lifecycle_valid() {
        assert!(validate_bottle_lifecycle(&bottle(BottleState::New, None)).is_ok());
        assert!(validate_bottle_lifecycle(&bottle(BottleState::WithLiquid, None)).is_ok());
        assert!(validate_bottle_lifecycle(&bottle(BottleState::Empty, Some(date(2024, 2, 1)))).is_ok());
        assert!(validate_bottle_lifecycle(&bottle(BottleState::Lost, Some(date(2024, 1, 1)))).is_ok());
    }

    #[test]
    fn test_bottle_lifecycle_removal_stamp_mismatch() {
        assert!(validate_bottle_lifecycle(&bottle(BottleState::Empty, None)).is_err());
        assert!(validate_bottle_lifecycle(&bottle(BottleState::WithLiquid, Some(date(2024, 2, 1)))).is_err());
    }

    #[test]
    fn test_bottle_lifecycle_removed_before_registration() {
        let b = bottle(BottleState::Lost, Some(date(2023, 12, 31)));
        assert_eq!(
            validate_bottle_lifecycle(&b),
            Err("Bottle removed before it was registered")
        );
    }

    #[test]
    fn test_bottle_lifecycle_weight_gain() {
        let mut b = bottle(BottleState::WithLiquid, None);
        b.current_weight = dec("1200");
        assert_eq!(
            validate_bottle_lifecycle(&b),
            Err("Current weight exceeds initial weight")
        );
    }
}
