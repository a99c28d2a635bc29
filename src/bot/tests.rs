//! Tests for the position coordinator.

use super::*;
use crate::domain::{Side, SourceType, Zone, ZoneSet, ZoneSide, ZoneStrength};
use crate::feed::{FeedError, MarketSnapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

const PAIR: &str = "BTC/USDT";

// ==================== Test collaborators ====================

#[derive(Default)]
struct StaticSource {
    snapshots: Mutex<HashMap<String, MarketSnapshot>>,
}

impl StaticSource {
    async fn set(&self, pair: &str, snapshot: MarketSnapshot) {
        self.snapshots
            .lock()
            .await
            .insert(pair.to_string(), snapshot);
    }
}

#[async_trait]
impl MarketSource for StaticSource {
    async fn snapshot(&self, pair: &str) -> Result<MarketSnapshot, FeedError> {
        self.snapshots
            .lock()
            .await
            .get(pair)
            .cloned()
            .ok_or_else(|| FeedError::UnknownPair(pair.to_string()))
    }
}

#[derive(Default)]
struct RecordingSink {
    placed: Mutex<Vec<ProtectiveOrder>>,
    replaced: Mutex<Vec<ProtectiveOrder>>,
    fail: AtomicBool,
    // (entered, release) pair that holds `replace` open until released.
    hold: Option<(Arc<Notify>, Arc<Notify>)>,
    // Same for `place`.
    place_hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

#[async_trait]
impl ProtectionSink for RecordingSink {
    async fn place(&self, order: &ProtectiveOrder) -> Result<(), SinkError> {
        if let Some((entered, release)) = &self.place_hold {
            entered.notify_one();
            release.notified().await;
        }
        self.placed.lock().await.push(order.clone());
        Ok(())
    }

    async fn replace(&self, order: &ProtectiveOrder) -> Result<(), SinkError> {
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("exchange down".into()));
        }
        self.replaced.lock().await.push(order.clone());
        Ok(())
    }
}

// ==================== Fixtures ====================

fn test_config(extra: &str) -> Config {
    let yaml = format!(
        r#"
app:
  name: levels-test
feed:
  path: unused.yaml
{}
"#,
        extra
    );
    Config::from_yaml(&yaml).unwrap()
}

fn bot_with(source: Arc<StaticSource>, sink: Arc<RecordingSink>, extra: &str) -> Bot {
    Bot::new(
        BotConfig {
            app_config: test_config(extra),
            version: "test".into(),
        },
        source,
        sink,
    )
}

fn snapshot(support: f64, resistance: f64) -> MarketSnapshot {
    MarketSnapshot {
        current_price: 50000.0,
        volatility: Some(500.0),
        zones: ZoneSet::new(
            vec![
                Zone::new(ZoneSide::Support, support, ZoneStrength::High, SourceType::Structural)
                    .with_touches(3)
                    .with_swing(),
            ],
            vec![
                Zone::new(ZoneSide::Resistance, resistance, ZoneStrength::High, SourceType::Structural)
                    .with_touches(2)
                    .with_swing(),
            ],
        ),
    }
}

fn long_seed() -> PositionSeed {
    PositionSeed {
        pair: PAIR.into(),
        side: Side::Long,
        entry_price: 50000.0,
        proposed_stop: None,
        proposed_target: None,
    }
}

async fn opened_bot(sink: Arc<RecordingSink>) -> (Bot, Arc<StaticSource>) {
    let source = Arc::new(StaticSource::default());
    source.set(PAIR, snapshot(49000.0, 52000.0)).await;
    let bot = bot_with(source.clone(), sink, "");
    bot.open_position(&long_seed()).await.unwrap();
    (bot, source)
}

// ==================== Entry tests ====================

#[tokio::test]
async fn test_open_position_places_zone_levels() {
    let sink = Arc::new(RecordingSink::default());
    let (bot, _) = opened_bot(sink.clone()).await;

    let position = bot.position(PAIR).await.unwrap();
    assert_eq!(position.phase, PositionPhase::Active);
    assert_eq!(position.state.stop, 48750.0);
    assert_eq!(position.state.target, 51875.0);
    assert_eq!(position.order.stop_price, Decimal::new(4875000, 2));

    let placed = sink.placed.lock().await;
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].target_price, Decimal::new(51875, 0));
    assert_eq!(bot.stats().await.entries_accepted, 1);
}

#[tokio::test]
async fn test_open_position_prefers_valid_proposal() {
    let source = Arc::new(StaticSource::default());
    source.set(PAIR, snapshot(49000.0, 52000.0)).await;
    let bot = bot_with(source, Arc::new(RecordingSink::default()), "");

    let seed = PositionSeed {
        proposed_stop: Some(49200.0),
        proposed_target: Some(51600.0),
        ..long_seed()
    };
    let entry = bot.open_position(&seed).await.unwrap();
    assert!(matches!(entry, EntryLevels::Proposed { .. }));
    assert_eq!(bot.position(PAIR).await.unwrap().state.stop, 49200.0);
}

#[tokio::test]
async fn test_open_position_rejected_without_zones() {
    let source = Arc::new(StaticSource::default());
    source
        .set(
            PAIR,
            MarketSnapshot {
                current_price: 50000.0,
                volatility: Some(500.0),
                zones: ZoneSet::default(),
            },
        )
        .await;
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(source, sink.clone(), "");

    let entry = bot.open_position(&long_seed()).await.unwrap();
    assert!(matches!(entry, EntryLevels::Rejected { .. }));
    assert!(bot.position(PAIR).await.is_none());
    assert!(sink.placed.lock().await.is_empty());
    assert_eq!(bot.stats().await.entries_rejected, 1);
}

#[tokio::test]
async fn test_open_position_twice_fails() {
    let (bot, _) = opened_bot(Arc::new(RecordingSink::default())).await;
    let result = bot.open_position(&long_seed()).await;
    assert!(matches!(result, Err(BotError::DuplicatePosition(_))));
}

#[tokio::test]
async fn test_open_position_sub_unit_pair_keeps_orders_off_price() {
    let source = Arc::new(StaticSource::default());
    source
        .set(
            "DOGE/USDT",
            MarketSnapshot {
                current_price: 0.1,
                volatility: None,
                zones: ZoneSet::new(
                    vec![Zone::new(ZoneSide::Support, 0.0995, ZoneStrength::High, SourceType::Structural)],
                    vec![Zone::new(ZoneSide::Resistance, 0.103, ZoneStrength::High, SourceType::Structural)],
                ),
            },
        )
        .await;
    let sink = Arc::new(RecordingSink::default());
    let bot = bot_with(source, sink.clone(), "");

    let seed = PositionSeed {
        pair: "DOGE/USDT".into(),
        entry_price: 0.1,
        ..long_seed()
    };
    let entry = bot.open_position(&seed).await.unwrap();
    let levels = entry.levels().unwrap();
    assert!((levels.stop - 0.099).abs() < 1e-9);
    assert!((levels.target - 0.1025).abs() < 1e-9);

    let placed = sink.placed.lock().await;
    let current = Decimal::new(1, 1);
    assert!(placed[0].stop_price < current);
    assert!(placed[0].target_price > current);
    assert_eq!(placed[0].stop_price, Decimal::new(9, 2));
    assert_eq!(placed[0].target_price, Decimal::new(11, 2));
}

#[tokio::test]
async fn test_concurrent_opens_place_one_order() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let sink = Arc::new(RecordingSink {
        place_hold: Some((entered.clone(), release.clone())),
        ..RecordingSink::default()
    });
    let source = Arc::new(StaticSource::default());
    source.set(PAIR, snapshot(49000.0, 52000.0)).await;
    let bot = Arc::new(bot_with(source, sink.clone(), ""));

    let first = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.open_position(&long_seed()).await })
    };
    entered.notified().await;

    let second = bot.open_position(&long_seed()).await;
    assert!(matches!(second, Err(BotError::DuplicatePosition(_))));

    release.notify_one();
    assert!(first.await.unwrap().unwrap().levels().is_some());
    assert_eq!(sink.placed.lock().await.len(), 1);
    assert_eq!(bot.tracked_pairs().await, vec![PAIR.to_string()]);
}

#[tokio::test]
async fn test_rejected_entry_releases_reservation() {
    let source = Arc::new(StaticSource::default());
    source
        .set(
            PAIR,
            MarketSnapshot {
                current_price: 50000.0,
                volatility: Some(500.0),
                zones: ZoneSet::default(),
            },
        )
        .await;
    let bot = bot_with(source.clone(), Arc::new(RecordingSink::default()), "");

    let entry = bot.open_position(&long_seed()).await.unwrap();
    assert!(matches!(entry, EntryLevels::Rejected { .. }));

    source.set(PAIR, snapshot(49000.0, 52000.0)).await;
    let entry = bot.open_position(&long_seed()).await.unwrap();
    assert!(entry.levels().is_some());
}

#[tokio::test]
async fn test_open_position_unknown_pair() {
    let bot = bot_with(
        Arc::new(StaticSource::default()),
        Arc::new(RecordingSink::default()),
        "",
    );
    let result = bot.open_position(&long_seed()).await;
    assert!(matches!(result, Err(BotError::Feed(FeedError::UnknownPair(_)))));
}

// ==================== Reevaluation tests ====================

#[tokio::test]
async fn test_reevaluation_tightens_but_never_loosens_stop() {
    let sink = Arc::new(RecordingSink::default());
    let (bot, source) = opened_bot(sink.clone()).await;

    // Stronger support closer to price: stop 49000, target 52375
    source.set(PAIR, snapshot(49250.0, 52500.0)).await;
    let outcome = bot.reevaluate_position(PAIR).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Replaced(_)));
    assert_eq!(bot.position(PAIR).await.unwrap().state.stop, 49000.0);

    // Zones fall back: fresh stop 48750 is held at 49000, target moves to 51875
    source.set(PAIR, snapshot(49000.0, 52000.0)).await;
    let outcome = bot.reevaluate_position(PAIR).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Replaced(_)));

    let position = bot.position(PAIR).await.unwrap();
    assert_eq!(position.state.stop, 49000.0);
    assert_eq!(position.state.target, 51875.0);
    assert_eq!(position.replacements, 2);
    assert_eq!(sink.replaced.lock().await.len(), 2);
}

#[tokio::test]
async fn test_reevaluation_unchanged_levels_do_not_churn() {
    let sink = Arc::new(RecordingSink::default());
    let (bot, _) = opened_bot(sink.clone()).await;

    let outcome = bot.reevaluate_position(PAIR).await.unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::Held(HoldReason::BelowThreshold { .. })
    ));
    assert!(sink.replaced.lock().await.is_empty());
    assert_eq!(bot.stats().await.held_below_threshold, 1);
}

#[tokio::test]
async fn test_reevaluation_keeps_protection_when_gate_rejects() {
    let sink = Arc::new(RecordingSink::default());
    let (bot, source) = opened_bot(sink.clone()).await;

    source
        .set(
            PAIR,
            MarketSnapshot {
                current_price: 50000.0,
                volatility: Some(500.0),
                zones: ZoneSet::default(),
            },
        )
        .await;
    let outcome = bot.reevaluate_position(PAIR).await.unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::Held(HoldReason::Rejected { .. })
    ));

    let position = bot.position(PAIR).await.unwrap();
    assert_eq!(position.state.stop, 48750.0);
    assert_eq!(position.phase, PositionPhase::Active);
}

#[tokio::test]
async fn test_failed_replacement_keeps_previous_levels() {
    let sink = Arc::new(RecordingSink::default());
    let (bot, source) = opened_bot(sink.clone()).await;
    sink.fail.store(true, Ordering::SeqCst);

    source.set(PAIR, snapshot(49250.0, 52500.0)).await;
    let result = bot.reevaluate_position(PAIR).await;
    assert!(matches!(result, Err(BotError::Sink(_))));

    let position = bot.position(PAIR).await.unwrap();
    assert_eq!(position.state.stop, 48750.0);
    assert_eq!(position.phase, PositionPhase::Active);
    assert_eq!(bot.stats().await.failed_replacements, 1);
}

#[tokio::test]
async fn test_unknown_position() {
    let bot = bot_with(
        Arc::new(StaticSource::default()),
        Arc::new(RecordingSink::default()),
        "",
    );
    assert!(matches!(
        bot.reevaluate_position(PAIR).await,
        Err(BotError::UnknownPosition(_))
    ));
}

// ==================== Single-flight tests ====================

#[tokio::test]
async fn test_in_flight_cycle_blocks_second_and_is_discarded_on_close() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let sink = Arc::new(RecordingSink {
        hold: Some((entered.clone(), release.clone())),
        ..RecordingSink::default()
    });
    let (bot, source) = opened_bot(sink.clone()).await;
    let bot = Arc::new(bot);

    source.set(PAIR, snapshot(49250.0, 52500.0)).await;
    let first = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.reevaluate_position(PAIR).await })
    };
    entered.notified().await;

    let second = bot.reevaluate_position(PAIR).await.unwrap();
    assert_eq!(second, CycleOutcome::InFlight);

    let close = {
        let bot = bot.clone();
        tokio::spawn(async move {
            bot.handle_event(PositionEvent::Closed { pair: PAIR.into() })
                .await
        })
    };
    while !bot.tracked_pairs().await.is_empty() {
        tokio::task::yield_now().await;
    }

    release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, CycleOutcome::Discarded);
    close.await.unwrap().unwrap();

    let stats = bot.stats().await;
    assert_eq!(stats.in_flight_skips, 1);
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.replacements, 0);
}

#[tokio::test]
async fn test_idle_slot_is_discarded_and_counted() {
    let (bot, _) = opened_bot(Arc::new(RecordingSink::default())).await;
    let slot = bot.positions.read().await.get(PAIR).cloned().unwrap();
    slot.position.lock().await.phase = PositionPhase::Idle;

    let outcome = bot.reevaluate_position(PAIR).await.unwrap();
    assert_eq!(outcome, CycleOutcome::Discarded);
    assert_eq!(bot.stats().await.discarded, 1);
    assert_eq!(bot.stats().await.reevaluations, 0);
}

// ==================== Event tests ====================

#[tokio::test]
async fn test_reduced_event_updates_fraction() {
    let (bot, _) = opened_bot(Arc::new(RecordingSink::default())).await;
    bot.handle_event(PositionEvent::Reduced {
        pair: PAIR.into(),
        remaining_fraction: 0.4,
    })
    .await
    .unwrap();

    let position = bot.position(PAIR).await.unwrap();
    assert_eq!(position.remaining_fraction, 0.4);
    assert_eq!(position.state.stop, 48750.0);
}

#[tokio::test]
async fn test_close_unknown_position() {
    let bot = bot_with(
        Arc::new(StaticSource::default()),
        Arc::new(RecordingSink::default()),
        "",
    );
    let result = bot
        .handle_event(PositionEvent::Closed { pair: PAIR.into() })
        .await;
    assert!(matches!(result, Err(BotError::UnknownPosition(_))));
}

// ==================== Loop tests ====================

#[tokio::test]
async fn test_start_opens_seeds_and_stops() {
    let source = Arc::new(StaticSource::default());
    source.set(PAIR, snapshot(49000.0, 52000.0)).await;
    let extra = r#"
reevaluation:
  interval: 20ms
positions:
  - pair: BTC/USDT
    side: long
    entry_price: 50000
"#;
    let bot = Arc::new(bot_with(source, Arc::new(RecordingSink::default()), extra));
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.start(rx).await })
    };

    while bot.stats().await.ticks < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(bot.is_running().await);
    assert_eq!(bot.tracked_pairs().await, vec![PAIR.to_string()]);

    let (_tx2, rx2) = mpsc::unbounded_channel();
    assert!(matches!(bot.start(rx2).await, Err(BotError::AlreadyRunning)));

    tx.send(PositionEvent::Closed { pair: PAIR.into() }).unwrap();
    while !bot.tracked_pairs().await.is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    bot.stop().await.unwrap();
    handle.await.unwrap().unwrap();
    assert!(!bot.is_running().await);
}
