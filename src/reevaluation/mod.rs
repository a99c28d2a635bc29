//! Periodic reevaluation of protective levels for an open position.
//!
//! Wraps the risk/reward gate with two rules: the stop only moves toward
//! reduced risk, and levels are replaced only when they drift past a
//! minimum relative change.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::domain::{Levels, RejectReason, ReevaluationState, Side, ZoneSet};
use crate::levels::{GateParams, decide};

/// Default minimum relative change that justifies replacing orders (0.2%).
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.002;

/// PositionPhase is the lifecycle of a position's protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionPhase {
    /// No open position.
    Idle,
    /// Position open, protective levels live.
    Active,
    /// New levels computed, replacement in flight.
    Updating,
}

impl PositionPhase {
    /// Phase after a reevaluation outcome. Only an active position can move to updating.
    pub fn after(self, outcome: &Reevaluation) -> PositionPhase {
        match (self, outcome) {
            (PositionPhase::Active, Reevaluation::Replace(_)) => PositionPhase::Updating,
            (phase, _) => phase,
        }
    }

    /// Phase after the external replacement finished, successfully or not.
    pub fn settle(self) -> PositionPhase {
        match self {
            PositionPhase::Updating => PositionPhase::Active,
            phase => phase,
        }
    }
}

impl fmt::Display for PositionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionPhase::Idle => write!(f, "idle"),
            PositionPhase::Active => write!(f, "active"),
            PositionPhase::Updating => write!(f, "updating"),
        }
    }
}

/// Why the live protection stays as it is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoldReason {
    /// The gate produced no levels this cycle.
    Rejected { reason: RejectReason },
    /// The reconciled stop would trigger immediately.
    WouldTrigger { stop: f64 },
    /// Neither level moved enough.
    BelowThreshold { stop_change: f64, target_change: f64 },
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::Rejected { reason } => write!(f, "gate rejected: {}", reason),
            HoldReason::WouldTrigger { stop } => {
                write!(f, "stop {:.2} would trigger immediately", stop)
            }
            HoldReason::BelowThreshold {
                stop_change,
                target_change,
            } => write!(
                f,
                "change below threshold (stop {:.3}%, target {:.3}%)",
                stop_change * 100.0,
                target_change * 100.0
            ),
        }
    }
}

/// Levels that should replace the live protection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Replacement {
    pub levels: Levels,
    /// Relative stop change against the previous stop.
    pub stop_change: f64,
    /// Relative target change against the previous target.
    pub target_change: f64,
}

/// Outcome of one reevaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reevaluation {
    Hold(HoldReason),
    Replace(Replacement),
}

/// Stop permitted by the favorable-direction rule.
pub fn reconcile_stop(side: Side, new_stop: f64, previous_stop: f64) -> f64 {
    match side {
        Side::Long => new_stop.max(previous_stop),
        Side::Short => new_stop.min(previous_stop),
    }
}

/// Relative change `|new - previous| / previous`. A non-positive previous value
/// counts as an unbounded change.
pub fn relative_change(new: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return f64::INFINITY;
    }
    (new - previous).abs() / previous
}

/// Reconciles freshly computed levels against the live protection.
pub fn reconcile(
    state: &ReevaluationState,
    current_price: f64,
    fresh: Levels,
    change_threshold: f64,
) -> Reevaluation {
    let stop = reconcile_stop(state.side, fresh.stop, state.stop);
    if !state.side.is_loss_side(stop, current_price) {
        return Reevaluation::Hold(HoldReason::WouldTrigger { stop });
    }

    let target = fresh.target;
    let stop_change = relative_change(stop, state.stop);
    let target_change = relative_change(target, state.target);

    if stop_change < change_threshold && target_change < change_threshold {
        return Reevaluation::Hold(HoldReason::BelowThreshold {
            stop_change,
            target_change,
        });
    }

    Reevaluation::Replace(Replacement {
        levels: Levels { stop, target },
        stop_change,
        target_change,
    })
}

/// ReevaluationPolicy reruns the gate for an open position and reconciles the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReevaluationPolicy {
    pub gate: GateParams,
    pub change_threshold: f64,
}

impl Default for ReevaluationPolicy {
    fn default() -> Self {
        Self {
            gate: GateParams::default(),
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
        }
    }
}

impl ReevaluationPolicy {
    /// Creates a new policy.
    pub fn new(gate: GateParams, change_threshold: f64) -> Self {
        Self {
            gate,
            change_threshold,
        }
    }

    /// Runs one cycle against fresh zones and volatility.
    ///
    /// A gate rejection never strips protection: the outcome is a hold.
    pub fn reevaluate(
        &self,
        state: &ReevaluationState,
        current_price: f64,
        zones: &ZoneSet,
        volatility: Option<f64>,
    ) -> Reevaluation {
        let decision = decide(current_price, state.side, zones, volatility, &self.gate);
        let Some(fresh) = decision.levels else {
            let reason = decision
                .reject_reason()
                .unwrap_or(RejectReason::RiskRewardNotMet { best_ratio: None });
            debug!(trace = %decision.trace, "Reevaluation produced no levels");
            return Reevaluation::Hold(HoldReason::Rejected { reason });
        };

        debug!(trace = %decision.trace, "Reevaluation produced levels");
        reconcile(state, current_price, fresh, self.change_threshold)
    }
}
