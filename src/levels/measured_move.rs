//! Measured move target projection.

use crate::domain::Side;

/// A target projected beyond the nearest opposite zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub target: f64,
    pub box_height: f64,
}

/// Projects the anchor-to-zone distance once more beyond `nearest_zone`.
///
/// Returns None if the projection does not land strictly on the profit side
/// of `current_price`.
pub fn project(anchor: f64, nearest_zone: f64, current_price: f64, side: Side) -> Option<Projection> {
    let box_height = (nearest_zone - anchor).abs();
    let target = side.toward_profit(nearest_zone, box_height);
    if !side.is_profit_side(target, current_price) {
        return None;
    }
    Some(Projection { target, box_height })
}
