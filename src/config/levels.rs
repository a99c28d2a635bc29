//! Stop/target engine configuration.

use serde::Deserialize;
use std::time::Duration;

use super::duration;
use crate::levels::GateParams;
use crate::reevaluation::{DEFAULT_CHANGE_THRESHOLD, ReevaluationPolicy};

/// Risk/reward gate settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelsConfig {
    /// Minimum reward/risk ratio (default: 1.5).
    #[serde(default = "default_min_rr")]
    pub min_rr: f64,
    /// Volatility multiplier behind the stop anchor (default: 0.5).
    #[serde(default = "default_stop_buffer_mult")]
    pub stop_buffer_mult: f64,
    /// Volatility multiplier in front of target zones (default: 0.25).
    #[serde(default = "default_target_buffer_mult")]
    pub target_buffer_mult: f64,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            min_rr: default_min_rr(),
            stop_buffer_mult: default_stop_buffer_mult(),
            target_buffer_mult: default_target_buffer_mult(),
        }
    }
}

impl LevelsConfig {
    /// Gate parameters for the engine.
    pub fn gate_params(&self) -> GateParams {
        GateParams {
            min_rr: self.min_rr,
            stop_buffer_mult: self.stop_buffer_mult,
            target_buffer_mult: self.target_buffer_mult,
        }
    }
}

/// Periodic reevaluation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReevaluationConfig {
    /// Interval between reevaluations of each open position (default: 15m).
    #[serde(default, with = "duration")]
    pub interval: Duration,
    /// Minimum relative change before replacing orders (default: 0.002).
    #[serde(default = "default_change_threshold")]
    pub change_threshold: f64,
}

impl Default for ReevaluationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            change_threshold: default_change_threshold(),
        }
    }
}

impl ReevaluationConfig {
    /// Configured interval, or 15 minutes when unset.
    pub fn interval_or_default(&self) -> Duration {
        if self.interval.is_zero() {
            Duration::from_secs(15 * 60)
        } else {
            self.interval
        }
    }

    /// Builds the reevaluation policy for the given gate settings.
    pub fn policy(&self, levels: &LevelsConfig) -> ReevaluationPolicy {
        ReevaluationPolicy::new(levels.gate_params(), self.change_threshold)
    }
}

fn default_min_rr() -> f64 {
    1.5
}

fn default_stop_buffer_mult() -> f64 {
    0.5
}

fn default_target_buffer_mult() -> f64 {
    0.25
}

fn default_change_threshold() -> f64 {
    DEFAULT_CHANGE_THRESHOLD
}
