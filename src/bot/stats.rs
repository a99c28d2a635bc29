//! Runtime statistics for the bot.

/// Runtime statistics for the bot.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub ticks: u64,
    pub reevaluations: u64,
    pub replacements: u64,
    pub failed_replacements: u64,
    pub held_rejected: u64,
    pub held_would_trigger: u64,
    pub held_below_threshold: u64,
    pub in_flight_skips: u64,
    pub discarded: u64,
    pub entries_accepted: u64,
    pub entries_rejected: u64,
}
