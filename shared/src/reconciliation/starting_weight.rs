//! Starting-weight resolution
//!
//! Reconstructs the weight a bottle had when a window opened from its
//! (irregular, possibly unweighed) inspection history. The decision table is
//! evaluated top to bottom and the first matching rule wins; the rules
//! overlap, so their order matters.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Bottle, InspectionItem};
use crate::types::DateRange;

/// How much inspection history a bottle has overall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    Never,
    Once,
    Repeated,
}

/// Counts and readings the decision table looks at
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InspectionSummary {
    pub total_inspections: usize,
    pub in_window: usize,
    pub in_window_with_weight: usize,
    /// Weight of the earliest in-window item, which may itself be unweighed
    pub first_in_window_weight: Option<Decimal>,
    pub earliest_weighed_in_window: Option<Decimal>,
}

impl InspectionSummary {
    /// Summarize every inspection item of one bottle against a window.
    ///
    /// Items may arrive in any order; ties on `measured_at` keep input order.
    pub fn from_items(items: &[InspectionItem], window: &DateRange) -> Self {
        let mut in_window: Vec<&InspectionItem> = items
            .iter()
            .filter(|item| window.contains_timestamp(item.measured_at))
            .collect();
        in_window.sort_by_key(|item| item.measured_at);

        Self {
            total_inspections: items.len(),
            in_window: in_window.len(),
            in_window_with_weight: in_window.iter().filter(|item| item.is_weighed()).count(),
            first_in_window_weight: in_window.first().and_then(|item| item.measured_weight),
            earliest_weighed_in_window: in_window.iter().find_map(|item| item.measured_weight),
        }
    }

    pub fn history(&self) -> History {
        match self.total_inspections {
            0 => History::Never,
            1 => History::Once,
            _ => History::Repeated,
        }
    }

    pub fn first_in_window_unweighed(&self) -> bool {
        self.in_window > 0 && self.first_in_window_weight.is_none()
    }
}

/// The rule that fixed a bottle's starting weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "weight", rename_all = "snake_case")]
pub enum StartingWeight {
    /// Repeatedly inspected, never during the window
    NotInspectedInWindow,
    /// Several in-window items, the first one unweighed
    FirstReadingUnweighed(Decimal),
    /// At least one weighed in-window item
    EarliestWeighedInWindow(Decimal),
    /// In-window items exist but none was weighed
    InWindowUnweighed,
    /// The only inspection falls outside the window
    SingleInspectionOutsideWindow,
    /// The only inspection falls inside the window
    SingleInspectionInWindow,
    NeverInspected,
}

impl StartingWeight {
    /// Evaluate the decision table for one bottle
    pub fn resolve(summary: &InspectionSummary) -> Self {
        match summary.history() {
            History::Repeated => {
                if summary.in_window == 0 {
                    return StartingWeight::NotInspectedInWindow;
                }
                if summary.in_window > 1
                    && summary.in_window_with_weight > 0
                    && summary.first_in_window_unweighed()
                {
                    if let Some(weight) = summary.earliest_weighed_in_window {
                        return StartingWeight::FirstReadingUnweighed(weight);
                    }
                }
                if summary.in_window_with_weight > 0 {
                    if let Some(weight) = summary.earliest_weighed_in_window {
                        return StartingWeight::EarliestWeighedInWindow(weight);
                    }
                }
                StartingWeight::InWindowUnweighed
            }
            History::Once if summary.in_window == 0 => StartingWeight::SingleInspectionOutsideWindow,
            // The single item's weight is ignored even when present
            History::Once => StartingWeight::SingleInspectionInWindow,
            History::Never => StartingWeight::NeverInspected,
        }
    }

    /// Position of the rule in the decision table (1-based)
    pub fn rule_number(&self) -> u8 {
        match self {
            StartingWeight::NotInspectedInWindow => 1,
            StartingWeight::FirstReadingUnweighed(_) => 2,
            StartingWeight::EarliestWeighedInWindow(_) => 3,
            StartingWeight::InWindowUnweighed => 4,
            StartingWeight::SingleInspectionOutsideWindow => 5,
            StartingWeight::SingleInspectionInWindow => 6,
            StartingWeight::NeverInspected => 7,
        }
    }

    /// Weight the bottle had when the window opened
    pub fn weight_for(&self, bottle: &Bottle) -> Decimal {
        match self {
            StartingWeight::FirstReadingUnweighed(weight)
            | StartingWeight::EarliestWeighedInWindow(weight) => *weight,
            StartingWeight::NotInspectedInWindow
            | StartingWeight::InWindowUnweighed
            | StartingWeight::SingleInspectionOutsideWindow => bottle.current_weight,
            StartingWeight::SingleInspectionInWindow | StartingWeight::NeverInspected => {
                bottle.initial_weight
            }
        }
    }

    /// Rules that leave the bottle with no measurable movement
    pub fn is_stationary(&self) -> bool {
        matches!(
            self,
            StartingWeight::NotInspectedInWindow
                | StartingWeight::InWindowUnweighed
                | StartingWeight::SingleInspectionOutsideWindow
        )
    }
}
