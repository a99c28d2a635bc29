//! Host coordinator for protected positions.
//!
//! Opens positions through the two-level entry chain, reevaluates their
//! protection on a fixed cadence and applies fill events. Every mutation of a
//! position goes through that position's own lock.

mod config;
mod error;
mod position;
mod sink;
mod stats;

pub use config::BotConfig;
pub use error::BotError;
pub use position::{PositionEvent, PositionSlot, TrackedPosition};
pub use sink::{DryRunSink, ProtectionSink, SinkError};
pub use stats::Stats;

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::config::{Config, PositionSeed};
use crate::domain::{ProtectiveOrder, ReevaluationState};
use crate::feed::{FileSource, MarketSource};
use crate::levels::{EntryLevels, GateParams, resolve_entry};
use crate::reevaluation::{
    HoldReason, PositionPhase, Reevaluation, ReevaluationPolicy, Replacement,
};

/// Result of one reevaluation attempt for a position.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Live protection unchanged.
    Held(HoldReason),
    /// Protection replaced and committed.
    Replaced(Replacement),
    /// Another sequence for this position was in flight.
    InFlight,
    /// The position closed during the cycle; the result was dropped.
    Discarded,
}

/// Bot keeps every open position protected by zone-anchored levels.
pub struct Bot {
    cfg: Config,
    source: Arc<dyn MarketSource>,
    sink: Arc<dyn ProtectionSink>,
    gate: GateParams,
    policy: ReevaluationPolicy,
    interval: Duration,

    version: String,
    started_at: Mutex<Option<Instant>>,
    running: Mutex<bool>,
    stats: Mutex<Stats>,

    positions: RwLock<HashMap<String, Arc<PositionSlot>>>,
    // Pairs with an entry in flight, reserved before anything is placed
    opening_pairs: RwLock<HashSet<String>>,
}

impl Bot {
    /// Creates a new Bot with explicit market and order collaborators.
    pub fn new(
        cfg: BotConfig,
        source: Arc<dyn MarketSource>,
        sink: Arc<dyn ProtectionSink>,
    ) -> Self {
        let app = cfg.app_config;
        let gate = app.levels.gate_params();
        let policy = app.reevaluation.policy(&app.levels);
        let interval = app.reevaluation.interval_or_default();

        Bot {
            cfg: app,
            source,
            sink,
            gate,
            policy,
            interval,
            version: cfg.version,
            started_at: Mutex::new(None),
            running: Mutex::new(false),
            stats: Mutex::new(Stats::default()),
            positions: RwLock::new(HashMap::new()),
            opening_pairs: RwLock::new(HashSet::new()),
        }
    }

    /// Creates a Bot reading snapshots from the configured file.
    ///
    /// Only dry-run execution is available; live order routing belongs to
    /// the order-management layer.
    pub fn from_config(cfg: BotConfig) -> Result<Self, BotError> {
        if !cfg.app_config.execution.dry_run {
            return Err(BotError::Config(
                "execution.dry_run=false requires an order-management sink".into(),
            ));
        }

        let source = Arc::new(FileSource::new(cfg.app_config.feed.path.clone()));
        Ok(Self::new(cfg, source, Arc::new(DryRunSink)))
    }

    /// Runs the entry chain for a seed without opening anything.
    pub async fn evaluate_entry(&self, seed: &PositionSeed) -> Result<EntryLevels, BotError> {
        let (entry, _) = self.entry_at_market(seed).await?;
        Ok(entry)
    }

    // Entry chain outcome together with the price it was computed at.
    async fn entry_at_market(&self, seed: &PositionSeed) -> Result<(EntryLevels, f64), BotError> {
        let snapshot = self.source.snapshot(&seed.pair).await?;
        let proposal = seed.proposal();

        let entry = resolve_entry(
            proposal.as_ref(),
            snapshot.current_price,
            seed.side,
            &snapshot.zones,
            snapshot.volatility,
            &self.gate,
        );
        Ok((entry, snapshot.current_price))
    }

    /// Opens and protects a position if the entry chain yields levels.
    ///
    /// A rejected entry is returned as-is and nothing is tracked. Concurrent
    /// opens of the same pair fail with `DuplicatePosition` before any order
    /// is placed.
    pub async fn open_position(&self, seed: &PositionSeed) -> Result<EntryLevels, BotError> {
        if !self.try_lock_pair(&seed.pair).await {
            return Err(BotError::DuplicatePosition(seed.pair.clone()));
        }

        let result = self.open_locked(seed).await;
        self.unlock_pair(&seed.pair).await;
        result
    }

    async fn open_locked(&self, seed: &PositionSeed) -> Result<EntryLevels, BotError> {
        let (entry, current_price) = self.entry_at_market(seed).await?;
        let Some(levels) = entry.levels() else {
            self.stats.lock().await.entries_rejected += 1;
            warn!(pair = %seed.pair, side = %seed.side, outcome = ?entry, "Entry rejected");
            return Ok(entry);
        };

        let order = ProtectiveOrder::from_levels(
            &seed.pair,
            seed.side,
            &levels,
            current_price,
            self.cfg.execution.price_precision,
        )
        .ok_or_else(|| BotError::InvalidOrderPrice(seed.pair.clone()))?;
        self.sink.place(&order).await?;

        let position = TrackedPosition {
            pair: seed.pair.clone(),
            state: ReevaluationState {
                side: seed.side,
                entry_price: seed.entry_price,
                stop: levels.stop,
                target: levels.target,
            },
            phase: PositionPhase::Active,
            order,
            remaining_fraction: 1.0,
            opened_at: Utc::now(),
            last_reevaluated_at: None,
            replacements: 0,
        };

        self.positions
            .write()
            .await
            .insert(seed.pair.clone(), Arc::new(PositionSlot::new(position)));
        self.stats.lock().await.entries_accepted += 1;

        info!(
            pair = %seed.pair,
            side = %seed.side,
            stop = levels.stop,
            target = levels.target,
            "Position protected"
        );
        Ok(entry)
    }

    /// Runs one reevaluation cycle for `pair`.
    ///
    /// New levels are committed only after the sink accepted them and the
    /// position is still open.
    pub async fn reevaluate_position(&self, pair: &str) -> Result<CycleOutcome, BotError> {
        let slot = self
            .positions
            .read()
            .await
            .get(pair)
            .cloned()
            .ok_or_else(|| BotError::UnknownPosition(pair.to_string()))?;

        let Ok(mut position) = slot.position.try_lock() else {
            self.stats.lock().await.in_flight_skips += 1;
            debug!(pair = %pair, "Reevaluation already in flight");
            return Ok(CycleOutcome::InFlight);
        };

        match position.phase {
            PositionPhase::Idle => {
                self.stats.lock().await.discarded += 1;
                return Ok(CycleOutcome::Discarded);
            }
            PositionPhase::Updating => {
                warn!(pair = %pair, "Previous replacement was abandoned, keeping last committed levels");
                position.phase = PositionPhase::Active;
            }
            PositionPhase::Active => {}
        }

        let snapshot = self.source.snapshot(pair).await?;
        if slot.is_closed() {
            self.stats.lock().await.discarded += 1;
            return Ok(CycleOutcome::Discarded);
        }

        let outcome = self.policy.reevaluate(
            &position.state,
            snapshot.current_price,
            &snapshot.zones,
            snapshot.volatility,
        );
        position.last_reevaluated_at = Some(Utc::now());
        self.stats.lock().await.reevaluations += 1;

        let replacement = match outcome {
            Reevaluation::Hold(reason) => {
                self.record_hold(&reason).await;
                debug!(pair = %pair, reason = %reason, "Protection unchanged");
                return Ok(CycleOutcome::Held(reason));
            }
            Reevaluation::Replace(replacement) => replacement,
        };

        let order = ProtectiveOrder::from_levels(
            pair,
            position.state.side,
            &replacement.levels,
            snapshot.current_price,
            self.cfg.execution.price_precision,
        )
        .ok_or_else(|| BotError::InvalidOrderPrice(pair.to_string()))?;

        position.phase = position.phase.after(&outcome);
        let sent = self.sink.replace(&order).await;
        position.phase = position.phase.settle();

        if let Err(e) = sent {
            self.stats.lock().await.failed_replacements += 1;
            warn!(pair = %pair, error = %e, "Replacement failed, previous protection stays live");
            return Err(e.into());
        }

        if slot.is_closed() {
            self.stats.lock().await.discarded += 1;
            info!(pair = %pair, "Position closed mid-cycle, replacement discarded");
            return Ok(CycleOutcome::Discarded);
        }

        position.state.stop = replacement.levels.stop;
        position.state.target = replacement.levels.target;
        position.order = order;
        position.replacements += 1;
        self.stats.lock().await.replacements += 1;

        info!(
            pair = %pair,
            stop = replacement.levels.stop,
            target = replacement.levels.target,
            stop_change = replacement.stop_change,
            target_change = replacement.target_change,
            "Protection replaced"
        );
        Ok(CycleOutcome::Replaced(replacement))
    }

    /// Reevaluates every tracked position once.
    pub async fn reevaluate_all(&self) {
        let pairs: Vec<String> = self.positions.read().await.keys().cloned().collect();
        self.stats.lock().await.ticks += 1;

        for pair in pairs {
            match self.reevaluate_position(&pair).await {
                Ok(outcome) => debug!(pair = %pair, outcome = ?outcome, "Cycle finished"),
                Err(BotError::UnknownPosition(_)) => {}
                Err(e) => warn!(pair = %pair, error = %e, "Cycle failed"),
            }
        }
    }

    /// Applies a fill event under the position's lock.
    pub async fn handle_event(&self, event: PositionEvent) -> Result<(), BotError> {
        match event {
            PositionEvent::Closed { pair } => {
                let slot = self
                    .positions
                    .write()
                    .await
                    .remove(&pair)
                    .ok_or_else(|| BotError::UnknownPosition(pair.clone()))?;
                slot.mark_closed();

                let mut position = slot.position.lock().await;
                position.phase = PositionPhase::Idle;
                info!(pair = %pair, replacements = position.replacements, "Position closed");
            }
            PositionEvent::Reduced {
                pair,
                remaining_fraction,
            } => {
                let slot = self
                    .positions
                    .read()
                    .await
                    .get(&pair)
                    .cloned()
                    .ok_or_else(|| BotError::UnknownPosition(pair.clone()))?;

                let mut position = slot.position.lock().await;
                position.remaining_fraction = remaining_fraction.clamp(0.0, 1.0);
                info!(pair = %pair, remaining = position.remaining_fraction, "Position reduced");
            }
        }
        Ok(())
    }

    /// Returns a copy of a tracked position.
    pub async fn position(&self, pair: &str) -> Option<TrackedPosition> {
        let slot = self.positions.read().await.get(pair).cloned()?;
        let position = slot.position.lock().await;
        Some(position.clone())
    }

    /// Returns the pairs of all tracked positions.
    pub async fn tracked_pairs(&self) -> Vec<String> {
        self.positions.read().await.keys().cloned().collect()
    }

    /// Opens every seeded position from the config. Failures are logged and skipped.
    pub async fn open_seeded_positions(&self) {
        for seed in self.cfg.positions.clone() {
            if let Err(e) = self.open_position(&seed).await {
                warn!(pair = %seed.pair, error = %e, "Failed to open position");
            }
        }
    }

    /// Starts the reevaluation loop and applies fill events until stopped.
    pub async fn start(
        &self,
        mut events: mpsc::UnboundedReceiver<PositionEvent>,
    ) -> Result<(), BotError> {
        {
            let mut running = self.running.lock().await;
            if *running {
                return Err(BotError::AlreadyRunning);
            }
            *running = true;
        }

        {
            let mut started_at = self.started_at.lock().await;
            *started_at = Some(Instant::now());
        }

        info!(
            version = %self.version,
            name = %self.cfg.app.name,
            interval = ?self.interval,
            min_rr = self.gate.min_rr,
            change_threshold = self.policy.change_threshold,
            "Starting protection loop"
        );

        self.open_seeded_positions().await;
        self.run_main_loop(&mut events).await
    }

    /// Gracefully stops the bot.
    pub async fn stop(&self) -> Result<(), BotError> {
        {
            let mut running = self.running.lock().await;
            if !*running {
                return Ok(());
            }
            *running = false;
        }

        let uptime = self.uptime().await;
        let stats = self.stats().await;
        info!(uptime = ?uptime, stats = ?stats, "Bot stopped");

        Ok(())
    }

    /// Returns a copy of the current statistics.
    pub async fn stats(&self) -> Stats {
        self.stats.lock().await.clone()
    }

    /// Returns true if the bot is currently running.
    pub async fn is_running(&self) -> bool {
        *self.running.lock().await
    }

    /// Returns how long the bot has been running.
    pub async fn uptime(&self) -> Duration {
        self.started_at
            .lock()
            .await
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    async fn run_main_loop(
        &self,
        events: &mut mpsc::UnboundedReceiver<PositionEvent>,
    ) -> Result<(), BotError> {
        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately; entry levels are fresh.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !self.is_running().await {
                        break;
                    }
                    self.reevaluate_all().await;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event channel closed");
                        break;
                    };
                    if let Err(e) = self.handle_event(event).await {
                        warn!(error = %e, "Failed to apply position event");
                    }
                }
            }
        }

        Ok(())
    }

    /// Reserves `pair` for an entry. Fails if it is tracked or already opening.
    async fn try_lock_pair(&self, pair: &str) -> bool {
        let positions = self.positions.read().await;
        let mut pairs = self.opening_pairs.write().await;
        if positions.contains_key(pair) || pairs.contains(pair) {
            return false;
        }
        pairs.insert(pair.to_string());
        true
    }

    /// Releases the entry reservation for `pair`.
    async fn unlock_pair(&self, pair: &str) {
        self.opening_pairs.write().await.remove(pair);
    }

    /// Counts a hold by its reason.
    async fn record_hold(&self, reason: &HoldReason) {
        let mut stats = self.stats.lock().await;
        match reason {
            HoldReason::Rejected { .. } => stats.held_rejected += 1,
            HoldReason::WouldTrigger { .. } => stats.held_would_trigger += 1,
            HoldReason::BelowThreshold { .. } => stats.held_below_threshold += 1,
        }
    }
}

#[cfg(test)]
mod tests;
