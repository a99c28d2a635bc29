//! Position side and the externally owned reevaluation state.

use serde::{Deserialize, Serialize};

use super::zone::{Zone, ZoneSet};

/// Side is the direction of an open or prospective position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Zones that can anchor the protective stop: support for long, resistance for short.
    pub fn protective_zones(self, zones: &ZoneSet) -> &[Zone] {
        match self {
            Side::Long => &zones.support_zones,
            Side::Short => &zones.resistance_zones,
        }
    }

    /// Zones that can serve as profit targets.
    pub fn target_zones(self, zones: &ZoneSet) -> &[Zone] {
        match self {
            Side::Long => &zones.resistance_zones,
            Side::Short => &zones.support_zones,
        }
    }

    /// Returns true if `price` is strictly on the loss side of `current_price`.
    pub fn is_loss_side(self, price: f64, current_price: f64) -> bool {
        match self {
            Side::Long => price < current_price,
            Side::Short => price > current_price,
        }
    }

    /// Returns true if `price` is strictly on the profit side of `current_price`.
    pub fn is_profit_side(self, price: f64, current_price: f64) -> bool {
        match self {
            Side::Long => price > current_price,
            Side::Short => price < current_price,
        }
    }

    /// Moves `price` by `offset` toward the loss side.
    pub fn toward_loss(self, price: f64, offset: f64) -> f64 {
        match self {
            Side::Long => price - offset,
            Side::Short => price + offset,
        }
    }

    /// Moves `price` by `offset` toward the profit side.
    pub fn toward_profit(self, price: f64, offset: f64) -> f64 {
        match self {
            Side::Long => price + offset,
            Side::Short => price - offset,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            _ => Err(format!("Unknown position side: {}", s)),
        }
    }
}

/// ReevaluationState is the live protection of an open position.
///
/// Owned by the position manager and passed in read-only on every reevaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReevaluationState {
    pub side: Side,
    pub entry_price: f64,
    /// Stop price of the currently live protective order.
    pub stop: f64,
    /// Target price of the currently live protective order.
    pub target: f64,
}
