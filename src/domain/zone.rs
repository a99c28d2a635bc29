//! Support/resistance zones produced by the upstream zone detector.

use serde::{Deserialize, Serialize};

/// ZoneSide tells which side of the market a zone defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneSide {
    Support,
    Resistance,
}

/// ZoneStrength is the detector's categorical strength rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneStrength {
    Low,
    Medium,
    High,
}

impl ZoneStrength {
    /// Tier used by the stop anchor score: LOW=1, MEDIUM=2, HIGH=3.
    pub fn tier(self) -> u32 {
        match self {
            ZoneStrength::Low => 1,
            ZoneStrength::Medium => 2,
            ZoneStrength::High => 3,
        }
    }

    /// Bonus used by the target ranker: LOW=0, MEDIUM=1, HIGH=2.
    pub fn bonus(self) -> u32 {
        self.tier() - 1
    }
}

/// SourceType is the quality tier of the evidence behind a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Confirmed by a swing point.
    Structural,
    /// Confirmed by a resting order wall.
    OrderFlow,
    /// Mathematically derived, e.g. pivot points.
    Projected,
    /// Round numbers.
    Psychological,
    /// Legacy classification, ranked with psychological levels.
    Technical,
}

impl SourceType {
    /// Quality tier in 0..=3. Every variant is ranked explicitly.
    pub fn quality_tier(self) -> u32 {
        match self {
            SourceType::Structural => 3,
            SourceType::OrderFlow => 2,
            SourceType::Projected => 1,
            SourceType::Psychological | SourceType::Technical => 0,
        }
    }
}

/// Zone is a price band identified as likely support or resistance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub side: ZoneSide,
    pub price_center: f64,
    pub price_low: f64,
    pub price_high: f64,
    pub strength: ZoneStrength,
    pub source_type: SourceType,
    /// Number of historical price touches.
    #[serde(default)]
    pub touch_count: u32,
    /// True when a structural swing confirms the zone.
    #[serde(default)]
    pub has_swing_point: bool,
    // Diagnostic attributes, not used by scoring.
    #[serde(default)]
    pub distance_pct: f64,
    #[serde(default)]
    pub has_order_wall: bool,
    #[serde(default)]
    pub wall_size: f64,
}

impl Zone {
    /// Creates a zone with a degenerate band at `price_center` and no diagnostics.
    pub fn new(
        side: ZoneSide,
        price_center: f64,
        strength: ZoneStrength,
        source_type: SourceType,
    ) -> Self {
        Self {
            side,
            price_center,
            price_low: price_center,
            price_high: price_center,
            strength,
            source_type,
            touch_count: 0,
            has_swing_point: false,
            distance_pct: 0.0,
            has_order_wall: false,
            wall_size: 0.0,
        }
    }

    /// Sets the touch count.
    pub fn with_touches(mut self, touch_count: u32) -> Self {
        self.touch_count = touch_count;
        self
    }

    /// Marks the zone as swing-confirmed.
    pub fn with_swing(mut self) -> Self {
        self.has_swing_point = true;
        self
    }

    /// Sets the price band around the center.
    pub fn with_band(mut self, price_low: f64, price_high: f64) -> Self {
        self.price_low = price_low;
        self.price_high = price_high;
        self
    }
}

/// ZoneSet holds the zones of one detection cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    #[serde(default)]
    pub support_zones: Vec<Zone>,
    #[serde(default)]
    pub resistance_zones: Vec<Zone>,
}

impl ZoneSet {
    /// Creates a zone set from both sequences.
    pub fn new(support_zones: Vec<Zone>, resistance_zones: Vec<Zone>) -> Self {
        Self {
            support_zones,
            resistance_zones,
        }
    }
}
