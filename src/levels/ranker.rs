//! Profit target candidate ranking.

use crate::domain::{Side, Zone};

/// Each quality point discounts effective distance by this share of volatility.
const QUALITY_DISCOUNT_VOLATILITY: f64 = 0.1;
/// Discount per quality point when volatility is absent, as a share of price.
const QUALITY_DISCOUNT_PCT: f64 = 0.001;

/// A target zone with its ranking inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub price: f64,
    pub distance: f64,
    pub quality: u32,
}

/// Target quality in 0..=7: source tier, strength, touches, swing.
pub fn target_quality(zone: &Zone) -> u32 {
    let touch_bonus = u32::from(zone.touch_count >= 2);
    let swing_bonus = u32::from(zone.has_swing_point);
    zone.source_type.quality_tier() + zone.strength.bonus() + touch_bonus + swing_bonus
}

/// Effective-distance discount applied per quality point.
pub fn discount_per_point(current_price: f64, volatility: Option<f64>) -> f64 {
    match volatility {
        Some(v) if v > 0.0 => v * QUALITY_DISCOUNT_VOLATILITY,
        _ => current_price * QUALITY_DISCOUNT_PCT,
    }
}

/// Orders opposite-side zones into a target preference list.
///
/// Zones not strictly on the profit side of `current_price` are dropped.
/// Sort key is `distance - quality * discount_per_point`, nearest first.
pub fn rank_targets(
    zones: &[Zone],
    current_price: f64,
    side: Side,
    volatility: Option<f64>,
) -> Vec<TargetCandidate> {
    let discount = discount_per_point(current_price, volatility);

    let mut candidates: Vec<TargetCandidate> = zones
        .iter()
        .filter(|z| side.is_profit_side(z.price_center, current_price))
        .map(|z| TargetCandidate {
            price: z.price_center,
            distance: (z.price_center - current_price).abs(),
            quality: target_quality(z),
        })
        .collect();

    candidates.sort_by(|a, b| {
        let ka = a.distance - f64::from(a.quality) * discount;
        let kb = b.distance - f64::from(b.quality) * discount;
        ka.total_cmp(&kb)
            .then_with(|| a.distance.total_cmp(&b.distance))
            .then_with(|| b.quality.cmp(&a.quality))
    });

    candidates
}

/// The candidate closest to price by raw distance.
pub fn nearest(candidates: &[TargetCandidate]) -> Option<&TargetCandidate> {
    candidates
        .iter()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
