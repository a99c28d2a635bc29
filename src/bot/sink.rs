//! Hand-off of protective orders to the order-management layer.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::domain::ProtectiveOrder;

/// Order placement errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The order layer refused the order.
    #[error("order rejected for {pair}: {reason}")]
    Rejected { pair: String, reason: String },

    /// The order layer could not be reached.
    #[error("order layer unavailable: {0}")]
    Unavailable(String),
}

/// ProtectionSink places and replaces the live stop/target orders of a position.
#[async_trait]
pub trait ProtectionSink: Send + Sync {
    /// Place initial protection for a newly opened position.
    async fn place(&self, order: &ProtectiveOrder) -> Result<(), SinkError>;

    /// Replace the live protection with `order`.
    /// On error the previous protection must still be live.
    async fn replace(&self, order: &ProtectiveOrder) -> Result<(), SinkError>;
}

/// DryRunSink logs protective orders instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl ProtectionSink for DryRunSink {
    async fn place(&self, order: &ProtectiveOrder) -> Result<(), SinkError> {
        info!(
            pair = %order.pair,
            side = %order.side,
            stop = %order.stop_price,
            target = %order.target_price,
            "[dry-run] Place protection"
        );
        Ok(())
    }

    async fn replace(&self, order: &ProtectiveOrder) -> Result<(), SinkError> {
        info!(
            pair = %order.pair,
            side = %order.side,
            stop = %order.stop_price,
            target = %order.target_price,
            "[dry-run] Replace protection"
        );
        Ok(())
    }
}
