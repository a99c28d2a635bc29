//! Market feed and position seed configuration.

use serde::Deserialize;

use crate::domain::Side;
use crate::levels::ProposedLevels;

/// Market snapshot source settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Path of the YAML snapshot file, re-read on every cycle.
    pub path: String,
}

/// A position the host opens and protects at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionSeed {
    /// Trading pair in "BASE/QUOTE" format.
    pub pair: String,
    pub side: Side,
    pub entry_price: f64,
    /// Externally proposed stop, validated before the zone engine runs.
    pub proposed_stop: Option<f64>,
    /// Externally proposed target, used only together with `proposed_stop`.
    pub proposed_target: Option<f64>,
}

impl PositionSeed {
    /// The proposed pair, if both prices are present.
    pub fn proposal(&self) -> Option<ProposedLevels> {
        match (self.proposed_stop, self.proposed_target) {
            (Some(stop), Some(target)) => Some(ProposedLevels { stop, target }),
            _ => None,
        }
    }
}
