//! Market inputs for the decision engine: price, volatility and zones.

mod file;

pub use file::FileSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ZoneSet;

/// Feed errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The snapshot source could not be read.
    #[error("failed to read snapshots: {0}")]
    Read(#[from] std::io::Error),

    /// The snapshot source could not be parsed.
    #[error("failed to parse snapshots: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// No snapshot for this pair.
    #[error("no snapshot for pair {0}")]
    UnknownPair(String),

    /// Snapshot values failed boundary checks.
    #[error("invalid snapshot for {pair}: {reason}")]
    Invalid { pair: String, reason: String },
}

/// MarketSnapshot is everything one decision cycle needs for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: f64,
    /// Volatility measure such as ATR; absent or zero selects price-based buffers.
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub zones: ZoneSet,
}

impl MarketSnapshot {
    /// Rejects non-finite prices and volatility before they reach the engine.
    pub fn validate(&self, pair: &str) -> Result<(), FeedError> {
        let invalid = |reason: &str| FeedError::Invalid {
            pair: pair.to_string(),
            reason: reason.to_string(),
        };

        if !self.current_price.is_finite() {
            return Err(invalid("current_price is not finite"));
        }
        if let Some(v) = self.volatility {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid("volatility must be finite and non-negative"));
            }
        }
        let zones = self
            .zones
            .support_zones
            .iter()
            .chain(self.zones.resistance_zones.iter());
        for zone in zones {
            if !zone.price_center.is_finite() {
                return Err(invalid("zone price is not finite"));
            }
        }
        Ok(())
    }
}

/// MarketSource provides a fresh snapshot per pair on every call.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Snapshot returns the current price, volatility and zones for `pair`.
    /// Implementations must not serve cached zones from a previous cycle.
    async fn snapshot(&self, pair: &str) -> Result<MarketSnapshot, FeedError>;
}
