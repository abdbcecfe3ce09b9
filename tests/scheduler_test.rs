//! Scheduler Loop Tests - Boundary Waits, Faults, Shutdown
//!
//! Runs the real scheduler loop on paused tokio time with a frozen clock
//! at `:59`, so every wait is exactly one second.

mod common;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tokio::sync::broadcast;

use common::{FixedClock, RecordingSink, ScriptedSource, Step};
use ton_price_publisher::domain::schedule::Clock;
use ton_price_publisher::ports::quote_source::QuoteSource;
use ton_price_publisher::ports::telemetry::NoopTelemetry;
use ton_price_publisher::usecases::acquisition::{PriceAcquisition, RetryPolicy};
use ton_price_publisher::usecases::publisher::Publisher;
use ton_price_publisher::usecases::scheduler::{Scheduler, SchedulerState};
use ton_price_publisher::usecases::source_chain::QuoteSourceChain;

fn build(source: Arc<ScriptedSource>, sink: Arc<RecordingSink>, clock: Arc<dyn Clock>) -> Scheduler {
    let source: Arc<dyn QuoteSource> = source;
    let chain = QuoteSourceChain::new(vec![source], Arc::new(NoopTelemetry));
    let acquisition = PriceAcquisition::new(
        chain,
        RetryPolicy {
            rounds: 3,
            backoff: Duration::from_secs(2),
            timeout_per_source: Duration::from_secs(15),
        },
        Arc::new(NoopTelemetry),
    );
    Scheduler::new(
        acquisition,
        Publisher::new(sink, "@tonprice"),
        clock,
        Arc::new(NoopTelemetry),
        Duration::from_secs(5),
    )
}

fn spawn(
    mut scheduler: Scheduler,
) -> (broadcast::Sender<()>, tokio::task::JoinHandle<Scheduler>) {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
        scheduler
    });
    (shutdown_tx, handle)
}

#[tokio::test(start_paused = true)]
async fn test_cycle_fires_on_boundary_then_waits_again() {
    let source = ScriptedSource::always("okx", 1, Step::Price(dec!(2.351)));
    let sink = Arc::new(RecordingSink::default());
    let scheduler = build(source, sink.clone(), FixedClock::at_second(59));

    let (shutdown_tx, handle) = spawn(scheduler);

    // Boundary at 1s, next at 2s; stop between them.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(sink.texts(), vec!["<b>2.351 $</b>"]);

    shutdown_tx.send(()).unwrap();
    let scheduler = handle.await.unwrap();
    assert_eq!(scheduler.cycles(), 1);
    assert_eq!(scheduler.state(), SchedulerState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_fires_before_the_boundary() {
    let source = ScriptedSource::always("okx", 1, Step::Price(dec!(2.351)));
    let sink = Arc::new(RecordingSink::default());
    // At :37 the first boundary is 23 seconds away.
    let scheduler = build(source.clone(), sink.clone(), FixedClock::at_second(37));

    let (shutdown_tx, handle) = spawn(scheduler);

    tokio::time::sleep(Duration::from_millis(22_900)).await;
    assert_eq!(source.calls(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(source.calls(), 1);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_loop_survives_a_panicking_cycle() {
    let source = ScriptedSource::new("kucoin", 1, vec![Step::Panic], Step::Price(dec!(2.4)));
    let sink = Arc::new(RecordingSink::default());
    let scheduler = build(source.clone(), sink.clone(), FixedClock::at_second(59));

    let (shutdown_tx, handle) = spawn(scheduler);

    // 1s: cycle panics. 1s + 5s cool-down + 1s wait = 7s: cycle publishes.
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert!(sink.texts().is_empty());

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(sink.texts(), vec!["<b>2.400 $</b>"]);

    shutdown_tx.send(()).unwrap();
    let scheduler = handle.await.unwrap();
    assert_eq!(scheduler.cycles(), 2);
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_loop_continues_after_no_price_cycle() {
    let source = ScriptedSource::new(
        "binance",
        1,
        vec![
            Step::Fail(ton_price_publisher::ports::quote_source::SourceUnavailable::BadStatus(500)),
            Step::Fail(ton_price_publisher::ports::quote_source::SourceUnavailable::BadStatus(500)),
            Step::Fail(ton_price_publisher::ports::quote_source::SourceUnavailable::BadStatus(500)),
        ],
        Step::Price(dec!(2.5)),
    );
    let sink = Arc::new(RecordingSink::default());
    let scheduler = build(source, sink.clone(), FixedClock::at_second(59));

    let (shutdown_tx, handle) = spawn(scheduler);

    // First cycle: 1s wait + 2 backoffs = ends at 5s with nothing sent.
    // Second cycle at 6s publishes.
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert_eq!(sink.texts(), vec!["<b>2.500 $</b>"]);

    shutdown_tx.send(()).unwrap();
    let scheduler = handle.await.unwrap();
    assert_eq!(scheduler.cycles(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_in_flight_cycle() {
    let source = ScriptedSource::always("kucoin", 1, Step::Hang(Duration::from_secs(10)));
    let sink = Arc::new(RecordingSink::default());
    let scheduler = build(source.clone(), sink.clone(), FixedClock::at_second(59));

    let (shutdown_tx, handle) = spawn(scheduler);

    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(source.calls(), 1);

    shutdown_tx.send(()).unwrap();
    let scheduler = handle.await.unwrap();
    assert!(sink.texts().is_empty());
    assert_eq!(scheduler.cycles(), 1);
}
