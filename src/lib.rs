//! Zone-anchored stop-loss and take-profit decisions for open positions.

pub mod bot;
pub mod config;
pub mod domain;
pub mod feed;
pub mod levels;
pub mod reevaluation;
