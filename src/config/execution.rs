//! Execution configuration.

use serde::Deserialize;

/// Protective order execution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Log replacements instead of sending them (default: true).
    #[serde(default = "default_true")]
    pub dry_run: bool,
    /// Decimal places of protective order prices (default: 2).
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            price_precision: default_price_precision(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_price_precision() -> u32 {
    2
}
