//! Protective order handed to the order-management layer.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::decision::Levels;
use super::position::Side;

/// ProtectiveOrder is the stop/target pair to place or replace on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveOrder {
    /// Trading pair in "BASE/QUOTE" format.
    pub pair: String,
    pub side: Side,
    pub stop_price: Decimal,
    pub target_price: Decimal,
}

impl ProtectiveOrder {
    /// Builds an order from engine levels rounded to `precision` decimal places.
    ///
    /// Each price is rounded away from `current_price` so rounding never
    /// tightens the stop or the target. Returns None if either price cannot
    /// be represented as a Decimal or the rounded pair no longer straddles
    /// `current_price`.
    pub fn from_levels(
        pair: &str,
        side: Side,
        levels: &Levels,
        current_price: f64,
        precision: u32,
    ) -> Option<Self> {
        let (stop_rounding, target_rounding) = match side {
            Side::Long => (
                RoundingStrategy::ToNegativeInfinity,
                RoundingStrategy::ToPositiveInfinity,
            ),
            Side::Short => (
                RoundingStrategy::ToPositiveInfinity,
                RoundingStrategy::ToNegativeInfinity,
            ),
        };
        let stop_price =
            Decimal::from_f64(levels.stop)?.round_dp_with_strategy(precision, stop_rounding);
        let target_price =
            Decimal::from_f64(levels.target)?.round_dp_with_strategy(precision, target_rounding);

        if !side.is_loss_side(stop_price.to_f64()?, current_price)
            || !side.is_profit_side(target_price.to_f64()?, current_price)
        {
            return None;
        }

        Some(Self {
            pair: pair.to_string(),
            side,
            stop_price,
            target_price,
        })
    }
}
