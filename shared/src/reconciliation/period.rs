//! Period selection: which bottles were alive during a window

use crate::models::Bottle;
use crate::types::DateRange;

/// A bottle is in scope when its lifespan intersects the window
pub fn is_active_during(bottle: &Bottle, window: &DateRange) -> bool {
    bottle.registered_at <= window.end
        && bottle.removed_at.map_or(true, |removed_at| removed_at >= window.start)
}

/// Bottles whose lifespan intersects `window`, in input order
pub fn select_bottles<'a>(bottles: &'a [Bottle], window: &DateRange) -> Vec<&'a Bottle> {
    bottles
        .iter()
        .filter(|bottle| is_active_during(bottle, window))
        .collect()
}
