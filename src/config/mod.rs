//! Configuration loading and validation.
//!
//! Uses serde_yaml to load YAML configuration files. Optional sections fall
//! back to the engine defaults.

mod app;
mod duration;
mod error;
mod execution;
mod levels;
mod position;

pub use app::AppConfig;
pub use error::ConfigError;
pub use execution::ExecutionConfig;
pub use levels::{LevelsConfig, ReevaluationConfig};
pub use position::{FeedConfig, PositionSeed};

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

/// Root configuration structure.
///
/// Required sections: app, feed.
/// Optional sections: levels, reevaluation, execution, positions.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and environment.
    pub app: AppConfig,
    /// Risk/reward gate parameters.
    #[serde(default)]
    pub levels: LevelsConfig,
    /// Periodic reevaluation cadence and churn threshold.
    #[serde(default)]
    pub reevaluation: ReevaluationConfig,
    /// Where market snapshots come from.
    pub feed: FeedConfig,
    /// Protective order settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Positions to open and protect at startup.
    #[serde(default)]
    pub positions: Vec<PositionSeed>,
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Loads environment variables from a `.env` file first, if present.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        if self.feed.path.is_empty() {
            return Err(ConfigError::Validation("feed.path is required".into()));
        }

        let levels = &self.levels;
        if !(levels.min_rr > 0.0) {
            return Err(ConfigError::Validation(
                "levels.min_rr must be positive".into(),
            ));
        }
        if !(levels.stop_buffer_mult >= 0.0) || !(levels.target_buffer_mult >= 0.0) {
            return Err(ConfigError::Validation(
                "levels buffer multipliers must not be negative".into(),
            ));
        }

        if !(self.reevaluation.change_threshold >= 0.0) {
            return Err(ConfigError::Validation(
                "reevaluation.change_threshold must not be negative".into(),
            ));
        }

        let mut seen = HashSet::new();
        for seed in &self.positions {
            if seed.pair.is_empty() {
                return Err(ConfigError::Validation(
                    "positions: pair is required".into(),
                ));
            }
            if !(seed.entry_price > 0.0) || !seed.entry_price.is_finite() {
                return Err(ConfigError::Position {
                    pair: seed.pair.clone(),
                    reason: "entry_price must be positive".into(),
                });
            }
            let proposed = [seed.proposed_stop, seed.proposed_target];
            if proposed.iter().flatten().any(|p| !p.is_finite()) {
                return Err(ConfigError::Position {
                    pair: seed.pair.clone(),
                    reason: "proposed levels must be finite".into(),
                });
            }
            if !seen.insert(seed.pair.as_str()) {
                return Err(ConfigError::Position {
                    pair: seed.pair.clone(),
                    reason: "duplicate pair".into(),
                });
            }
        }

        Ok(())
    }
}
