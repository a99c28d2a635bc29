//! Two-level entry chain: a proposed pair first, zone-derived levels second.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::gate::{decide, meets_min_rr};
use super::GateParams;
use crate::domain::{Decision, Levels, Side, ZoneSet};

/// Stop and target proposed by an upstream source (e.g. an AI debate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProposedLevels {
    pub stop: f64,
    pub target: f64,
}

/// Why a proposed pair failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalRejection {
    /// Stop or target is on the wrong side of the current price.
    WrongSide,
    /// Side-correct, but reward/risk is below the minimum.
    RatioTooLow { ratio: f64 },
}

impl fmt::Display for ProposalRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalRejection::WrongSide => write!(f, "proposed levels on wrong side of price"),
            ProposalRejection::RatioTooLow { ratio } => {
                write!(f, "proposed R/R {:.2} below minimum", ratio)
            }
        }
    }
}

/// Outcome of the entry chain. There is no third level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum EntryLevels {
    /// Level 1: the proposed pair passed validation.
    Proposed { levels: Levels, ratio: f64 },
    /// Level 2: the zone engine produced levels.
    ZoneDerived {
        decision: Decision,
        proposal: Option<ProposalRejection>,
    },
    /// Both levels failed: do not enter.
    Rejected {
        decision: Decision,
        proposal: Option<ProposalRejection>,
    },
}

impl EntryLevels {
    /// Accepted levels, if any level succeeded.
    pub fn levels(&self) -> Option<Levels> {
        match self {
            EntryLevels::Proposed { levels, .. } => Some(*levels),
            EntryLevels::ZoneDerived { decision, .. } => decision.levels,
            EntryLevels::Rejected { .. } => None,
        }
    }
}

/// Validates a proposed pair for side correctness and minimum ratio.
pub fn validate_proposal(
    proposal: &ProposedLevels,
    current_price: f64,
    side: Side,
    min_rr: f64,
) -> Result<Levels, ProposalRejection> {
    if !side.is_loss_side(proposal.stop, current_price)
        || !side.is_profit_side(proposal.target, current_price)
    {
        return Err(ProposalRejection::WrongSide);
    }

    let levels = Levels {
        stop: proposal.stop,
        target: proposal.target,
    };
    let ratio = levels.ratio(current_price);
    if !meets_min_rr(ratio, min_rr) {
        return Err(ProposalRejection::RatioTooLow { ratio });
    }
    Ok(levels)
}

/// Resolves entry levels: proposal first, then the zone engine, then rejection.
pub fn resolve_entry(
    proposal: Option<&ProposedLevels>,
    current_price: f64,
    side: Side,
    zones: &ZoneSet,
    volatility: Option<f64>,
    params: &GateParams,
) -> EntryLevels {
    let proposal_rejection = match proposal {
        Some(p) if current_price > 0.0 => {
            match validate_proposal(p, current_price, side, params.min_rr) {
                Ok(levels) => {
                    return EntryLevels::Proposed {
                        levels,
                        ratio: levels.ratio(current_price),
                    };
                }
                Err(e) => Some(e),
            }
        }
        _ => None,
    };

    let decision = decide(current_price, side, zones, volatility, params);
    if decision.is_accepted() {
        EntryLevels::ZoneDerived {
            decision,
            proposal: proposal_rejection,
        }
    } else {
        EntryLevels::Rejected {
            decision,
            proposal: proposal_rejection,
        }
    }
}
