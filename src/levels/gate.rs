//! Risk/reward gate combining anchor, buffers, ranked targets and the measured move.

use tracing::debug;

use super::anchor::select_anchor;
use super::buffer::buffer;
use super::measured_move::project;
use super::ranker::{nearest, rank_targets};
use super::GateParams;
use crate::domain::{Decision, DecisionPath, Levels, RejectReason, Side, Trace, ZoneSet};

/// Floating tolerance for the minimum ratio comparison.
pub const RATIO_EPSILON: f64 = 1e-9;

/// Returns true if `ratio` clears `min_rr` within tolerance.
pub fn meets_min_rr(ratio: f64, min_rr: f64) -> bool {
    ratio + RATIO_EPSILON >= min_rr
}

/// Decides stop and target prices for `side` at `current_price`.
///
/// The stop is anchored behind the strongest protective zone. Targets are
/// tried in ranked order, then a single measured move projection. If nothing
/// clears `params.min_rr` the decision carries no prices.
pub fn decide(
    current_price: f64,
    side: Side,
    zones: &ZoneSet,
    volatility: Option<f64>,
    params: &GateParams,
) -> Decision {
    if current_price <= 0.0 {
        return Decision::rejected(Trace::rejected(RejectReason::InvalidPrice));
    }

    let Some(anchor) = select_anchor(
        side.protective_zones(zones),
        current_price,
        side,
        volatility,
    ) else {
        return Decision::rejected(Trace::rejected(RejectReason::NoStopAnchor));
    };
    let anchor = anchor.price_center;

    let stop_buffer = buffer(volatility, params.stop_buffer_mult, current_price);
    let mut stop = side.toward_loss(anchor, stop_buffer);
    if !side.is_loss_side(stop, current_price) {
        stop = side.toward_loss(current_price, 2.0 * stop_buffer);
        debug!(anchor, stop, "Stop clamped behind current price");
    }

    let mut trace = Trace {
        path: DecisionPath::Rejected {
            reason: RejectReason::ZeroRisk,
        },
        anchor: Some(anchor),
        stop_buffer: Some(stop_buffer),
        target_buffer: None,
        ratio: None,
    };

    let risk = (current_price - stop).abs();
    if risk <= 0.0 {
        return Decision::rejected(trace);
    }

    let candidates = rank_targets(side.target_zones(zones), current_price, side, volatility);
    let target_buffer = buffer(volatility, params.target_buffer_mult, current_price);
    trace.target_buffer = Some(target_buffer);

    let mut best_ratio: Option<f64> = None;

    for (rank, candidate) in candidates.iter().enumerate() {
        let target = side.toward_loss(candidate.price, target_buffer);
        if !side.is_profit_side(target, current_price) {
            debug!(zone = candidate.price, target, "Buffered target crosses current price");
            continue;
        }

        let ratio = (target - current_price).abs() / risk;
        best_ratio = Some(best_ratio.map_or(ratio, |b| b.max(ratio)));

        if meets_min_rr(ratio, params.min_rr) {
            trace.path = DecisionPath::Zone {
                zone_price: candidate.price,
                rank,
            };
            trace.ratio = Some(ratio);
            return Decision::accepted(Levels { stop, target }, trace);
        }
        debug!(zone = candidate.price, ratio, "Target zone below min R/R");
    }

    if let Some(near) = nearest(&candidates) {
        if let Some(projection) = project(anchor, near.price, current_price, side) {
            let target = side.toward_loss(projection.target, target_buffer / 2.0);
            if side.is_profit_side(target, current_price) {
                let ratio = (target - current_price).abs() / risk;
                best_ratio = Some(best_ratio.map_or(ratio, |b| b.max(ratio)));

                if meets_min_rr(ratio, params.min_rr) {
                    trace.path = DecisionPath::MeasuredMove {
                        nearest_zone: near.price,
                        box_height: projection.box_height,
                    };
                    trace.ratio = Some(ratio);
                    return Decision::accepted(Levels { stop, target }, trace);
                }
            }
        }
    }

    trace.path = DecisionPath::Rejected {
        reason: RejectReason::RiskRewardNotMet { best_ratio },
    };
    trace.ratio = best_ratio;
    Decision::rejected(trace)
}
