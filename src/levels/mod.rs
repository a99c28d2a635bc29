//! Zone-anchored stop-loss and take-profit engine.
//!
//! Every function here is pure: no I/O, no locks, no caching. The same
//! inputs always give the same decision.

mod anchor;
mod buffer;
mod entry;
mod gate;
mod measured_move;
mod ranker;

pub use anchor::{anchor_score, max_anchor_distance, select_anchor};
pub use buffer::{FALLBACK_BUFFER_PCT, buffer};
pub use entry::{EntryLevels, ProposalRejection, ProposedLevels, resolve_entry, validate_proposal};
pub use gate::{RATIO_EPSILON, decide, meets_min_rr};
pub use measured_move::{Projection, project};
pub use ranker::{TargetCandidate, discount_per_point, nearest, rank_targets, target_quality};

/// Parameters of the risk/reward gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateParams {
    /// Minimum reward/risk ratio for acceptance.
    pub min_rr: f64,
    /// Volatility multiplier for the buffer behind the stop anchor.
    pub stop_buffer_mult: f64,
    /// Volatility multiplier for the buffer in front of target zones.
    pub target_buffer_mult: f64,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            min_rr: 1.5,
            stop_buffer_mult: 0.5,
            target_buffer_mult: 0.25,
        }
    }
}
