//! Tracked positions and their single-flight slots.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::domain::{ProtectiveOrder, ReevaluationState};
use crate::reevaluation::PositionPhase;

/// Fill events from the exchange connection.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    /// The position was fully closed.
    Closed { pair: String },
    /// The position was partially reduced.
    Reduced { pair: String, remaining_fraction: f64 },
}

/// TrackedPosition is the host-owned state of one open position.
#[derive(Debug, Clone)]
pub struct TrackedPosition {
    pub pair: String,
    pub state: ReevaluationState,
    pub phase: PositionPhase,
    /// Protective order currently live on the exchange.
    pub order: ProtectiveOrder,
    /// Share of the original size still open.
    pub remaining_fraction: f64,
    pub opened_at: DateTime<Utc>,
    pub last_reevaluated_at: Option<DateTime<Utc>>,
    pub replacements: u32,
}

/// PositionSlot serializes all mutations of one position.
///
/// `closed` is set without taking the lock so an in-flight cycle can see
/// that its result must be discarded.
#[derive(Debug)]
pub struct PositionSlot {
    pub position: Mutex<TrackedPosition>,
    closed: AtomicBool,
}

impl PositionSlot {
    pub fn new(position: TrackedPosition) -> Self {
        Self {
            position: Mutex::new(position),
            closed: AtomicBool::new(false),
        }
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
