//! Output of the stop/target decision engine.

use serde::Serialize;
use std::fmt;

/// Levels is an accepted (stop, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Levels {
    pub stop: f64,
    pub target: f64,
}

impl Levels {
    /// Reward-to-risk ratio of these levels measured from `current_price`.
    pub fn ratio(&self, current_price: f64) -> f64 {
        let risk = (current_price - self.stop).abs();
        if risk <= 0.0 {
            return 0.0;
        }
        (self.target - current_price).abs() / risk
    }
}

/// RejectReason explains why no levels were produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Current price was zero or negative.
    InvalidPrice,
    /// No protective-side zone survived filtering.
    NoStopAnchor,
    /// The buffered stop collapsed onto the current price.
    ZeroRisk,
    /// Neither a real zone nor the measured move cleared the minimum ratio.
    RiskRewardNotMet { best_ratio: Option<f64> },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidPrice => write!(f, "invalid current price"),
            RejectReason::NoStopAnchor => write!(f, "no structural zone for stop anchor"),
            RejectReason::ZeroRisk => write!(f, "zero risk distance"),
            RejectReason::RiskRewardNotMet { best_ratio: Some(r) } => {
                write!(f, "no target zone meets min R/R (best {:.2})", r)
            }
            RejectReason::RiskRewardNotMet { best_ratio: None } => {
                write!(f, "no target zone meets min R/R (no valid candidate)")
            }
        }
    }
}

/// DecisionPath records which route produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum DecisionPath {
    /// A ranked target zone cleared the ratio directly.
    Zone { zone_price: f64, rank: usize },
    /// The measured move projection cleared the ratio.
    MeasuredMove { nearest_zone: f64, box_height: f64 },
    Rejected { reason: RejectReason },
}

/// Trace is the structured diagnostic attached to every decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trace {
    #[serde(flatten)]
    pub path: DecisionPath,
    /// Zone price that anchored the stop, when one was found.
    pub anchor: Option<f64>,
    pub stop_buffer: Option<f64>,
    pub target_buffer: Option<f64>,
    /// Ratio of the accepted levels, or the best ratio seen on rejection.
    pub ratio: Option<f64>,
}

impl Trace {
    pub(crate) fn rejected(reason: RejectReason) -> Self {
        Self {
            path: DecisionPath::Rejected { reason },
            anchor: None,
            stop_buffer: None,
            target_buffer: None,
            ratio: None,
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path {
            DecisionPath::Zone { zone_price, rank } => write!(
                f,
                "zone target {:.2} (rank {}), anchor {:.2}",
                zone_price,
                rank,
                self.anchor.unwrap_or_default()
            )?,
            DecisionPath::MeasuredMove {
                nearest_zone,
                box_height,
            } => write!(
                f,
                "measured move from {:.2} (box {:.2}), anchor {:.2}",
                nearest_zone,
                box_height,
                self.anchor.unwrap_or_default()
            )?,
            DecisionPath::Rejected { reason } => return write!(f, "rejected: {}", reason),
        }
        if let Some(ratio) = self.ratio {
            write!(f, ", R/R {:.2}", ratio)?;
        }
        Ok(())
    }
}

/// Decision is the engine's only output.
///
/// Either both prices are present or neither is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub levels: Option<Levels>,
    pub trace: Trace,
}

impl Decision {
    pub(crate) fn accepted(levels: Levels, trace: Trace) -> Self {
        Self {
            levels: Some(levels),
            trace,
        }
    }

    pub(crate) fn rejected(trace: Trace) -> Self {
        Self {
            levels: None,
            trace,
        }
    }

    /// Returns true if the decision carries levels.
    pub fn is_accepted(&self) -> bool {
        self.levels.is_some()
    }

    pub fn stop(&self) -> Option<f64> {
        self.levels.map(|l| l.stop)
    }

    pub fn target(&self) -> Option<f64> {
        self.levels.map(|l| l.target)
    }

    /// Rejection reason, if the decision was rejected.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self.trace.path {
            DecisionPath::Rejected { reason } => Some(reason),
            _ => None,
        }
    }
}
