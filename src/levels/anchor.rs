//! Stop anchor selection.

use std::cmp::Ordering;

use crate::domain::{Side, Zone};

/// Anchors farther than this many volatility units are ignored.
const MAX_ANCHOR_VOLATILITY_UNITS: f64 = 5.0;
/// Anchors farther than this share of price are ignored (if larger than the volatility cap).
const MAX_ANCHOR_PCT: f64 = 0.05;

/// Maximum distance from current price a stop anchor may sit.
pub fn max_anchor_distance(current_price: f64, volatility: Option<f64>) -> f64 {
    let by_volatility = volatility.unwrap_or(0.0).max(0.0) * MAX_ANCHOR_VOLATILITY_UNITS;
    by_volatility.max(current_price * MAX_ANCHOR_PCT)
}

/// Composite score of a candidate stop anchor.
///
/// Strength dominates, then source quality, then touches and swing
/// confirmation. Proximity lies in [0, 1] and only breaks ties.
pub fn anchor_score(zone: &Zone, distance: f64, max_distance: f64) -> f64 {
    let touch_bonus = if zone.touch_count >= 2 {
        zone.touch_count.min(3)
    } else {
        0
    };
    let swing_bonus = if zone.has_swing_point { 2 } else { 0 };
    let proximity = if max_distance > 0.0 {
        (1.0 - distance / max_distance).clamp(0.0, 1.0)
    } else {
        0.0
    };

    f64::from(zone.strength.tier() * 10)
        + f64::from(zone.source_type.quality_tier() * 5)
        + f64::from(touch_bonus * 3)
        + f64::from(swing_bonus * 2)
        + proximity
}

/// Picks the highest scoring protective zone, or None if none survive filtering.
///
/// `zones` must be the protective side for `side` (support for long,
/// resistance for short). The result does not depend on input order.
pub fn select_anchor<'a>(
    zones: &'a [Zone],
    current_price: f64,
    side: Side,
    volatility: Option<f64>,
) -> Option<&'a Zone> {
    let max_distance = max_anchor_distance(current_price, volatility);

    zones
        .iter()
        .filter(|z| side.is_loss_side(z.price_center, current_price))
        .filter_map(|z| {
            let distance = (current_price - z.price_center).abs();
            if distance > max_distance {
                return None;
            }
            Some((z, anchor_score(z, distance, max_distance)))
        })
        .max_by(|(a, sa), (b, sb)| {
            sa.total_cmp(sb)
                .then_with(|| closer_first(side, a, b))
                .then_with(|| a.price_low.total_cmp(&b.price_low))
                .then_with(|| a.price_high.total_cmp(&b.price_high))
        })
        .map(|(z, _)| z)
}

// Orders so that the zone nearer to price compares greater.
fn closer_first(side: Side, a: &Zone, b: &Zone) -> Ordering {
    match side {
        Side::Long => a.price_center.total_cmp(&b.price_center),
        Side::Short => b.price_center.total_cmp(&a.price_center),
    }
}
