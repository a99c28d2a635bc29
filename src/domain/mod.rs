//! Domain models for zone-anchored stop/target decisions.

mod decision;
mod order;
mod position;
mod zone;

pub use decision::{Decision, DecisionPath, Levels, RejectReason, Trace};
pub use order::ProtectiveOrder;
pub use position::{ReevaluationState, Side};
pub use zone::{SourceType, Zone, ZoneSet, ZoneSide, ZoneStrength};
