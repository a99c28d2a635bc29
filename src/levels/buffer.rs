//! Volatility-sized price buffers.

/// Share of current price used when no volatility is available.
/// Only sizes buffers, never a stop or target level.
pub const FALLBACK_BUFFER_PCT: f64 = 0.005;

/// Converts a volatility measure into an absolute price offset.
///
/// Positive volatility gives `volatility * multiplier`; zero or absent
/// volatility falls back to `current_price * 0.5%`.
pub fn buffer(volatility: Option<f64>, multiplier: f64, current_price: f64) -> f64 {
    let offset = match volatility {
        Some(v) if v > 0.0 => v * multiplier,
        _ => current_price * FALLBACK_BUFFER_PCT,
    };
    offset.max(0.0)
}
