//! Bot error types.

use crate::feed::FeedError;

use super::sink::SinkError;

/// Bot error type.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("bot is already running")]
    AlreadyRunning,
    #[error("config error: {0}")]
    Config(String),
    #[error("position {0} is already tracked")]
    DuplicatePosition(String),
    #[error("position {0} is not tracked")]
    UnknownPosition(String),
    #[error("position {0}: levels cannot be expressed as order prices")]
    InvalidOrderPrice(String),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("order error: {0}")]
    Sink(#[from] SinkError),
}
