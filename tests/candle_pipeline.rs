// =============================================================================
// End-to-end pipeline tests: dispatcher → aggregator → bar sink
// =============================================================================

use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use bittrex::{Candle, CandleAggregator, Trade, TradeDispatcher, TradeSide};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn trade(base: &str, market: &str, price: f64, quantity: f64) -> Trade {
    Trade {
        base_currency: base.into(),
        market_currency: market.into(),
        side: TradeSide::Buy,
        price,
        quantity,
        time: Utc::now(),
    }
}

async fn recv_bar(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Candle>) -> Candle {
    tokio::time::timeout(Duration::from_secs(300), rx.recv())
        .await
        .expect("no bar flushed")
        .expect("sink channel closed")
}

// Runs under paused time: the runtime auto-advances the clock whenever every
// task is idle, so the one-minute windows elapse instantly and
// deterministically.
#[tokio::test(start_paused = true)]
async fn trades_flow_through_to_flushed_bars() {
    init_tracing();

    let dispatcher = TradeDispatcher::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let aggregator = CandleAggregator::new(Duration::from_secs(60), move |bar| {
        let _ = tx.send(bar);
    });
    aggregator.attach(&dispatcher);

    dispatcher.dispatch(&trade("BTC", "LTC", 10.0, 1.0));
    dispatcher.dispatch(&trade("BTC", "LTC", 12.0, 2.0));
    dispatcher.dispatch(&trade("BTC", "LTC", 9.0, 1.0));

    // Let the observer drain its queue, then cross the window boundary.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(aggregator.market_count(), 1);

    let bar = recv_bar(&mut rx).await;
    assert_eq!(bar.market, "BTC-LTC");
    assert_eq!(bar.open, 10.0);
    assert_eq!(bar.high, 12.0);
    assert_eq!(bar.low, 9.0);
    assert_eq!(bar.close, 9.0);
    assert_eq!(bar.volume, 4.0);

    // A window with no trades still produces a bar, carried from the close.
    let degenerate = recv_bar(&mut rx).await;
    assert_eq!(degenerate.open, 9.0);
    assert_eq!(degenerate.high, 9.0);
    assert_eq!(degenerate.low, 9.0);
    assert_eq!(degenerate.close, 9.0);
    assert_eq!(degenerate.volume, 0.0);
}

#[tokio::test(start_paused = true)]
async fn two_markets_flush_independent_bars() {
    init_tracing();

    let dispatcher = TradeDispatcher::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let aggregator = CandleAggregator::new(Duration::from_secs(60), move |bar| {
        let _ = tx.send(bar);
    });
    aggregator.attach(&dispatcher);

    dispatcher.dispatch(&trade("BTC", "LTC", 10.0, 1.0));
    dispatcher.dispatch(&trade("BTC", "ETH", 20.0, 2.0));

    let mut bars = vec![recv_bar(&mut rx).await, recv_bar(&mut rx).await];
    bars.sort_by(|a, b| a.market.cmp(&b.market));

    assert_eq!(bars[0].market, "BTC-ETH");
    assert_eq!(bars[0].open, 20.0);
    assert_eq!(bars[0].volume, 2.0);
    assert_eq!(bars[1].market, "BTC-LTC");
    assert_eq!(bars[1].open, 10.0);
    assert_eq!(bars[1].volume, 1.0);
}

#[tokio::test(start_paused = true)]
async fn aggregator_shares_the_dispatcher_with_other_observers() {
    init_tracing();

    let dispatcher = TradeDispatcher::new();

    // A plain observer alongside the aggregator's subscription.
    let (raw_tx, mut raw_rx) = tokio::sync::mpsc::unbounded_channel::<Trade>();
    dispatcher.register(move |t| {
        let _ = raw_tx.send(t);
    });

    let (bar_tx, mut bar_rx) = tokio::sync::mpsc::unbounded_channel();
    let aggregator = CandleAggregator::new(Duration::from_secs(60), move |bar| {
        let _ = bar_tx.send(bar);
    });
    aggregator.attach(&dispatcher);
    assert_eq!(dispatcher.observer_count(), 2);

    dispatcher.dispatch(&trade("BTC", "LTC", 10.0, 1.0));

    let raw = tokio::time::timeout(Duration::from_secs(5), raw_rx.recv())
        .await
        .expect("raw observer starved")
        .expect("channel closed");
    assert_eq!(raw.price, 10.0);

    let bar = recv_bar(&mut bar_rx).await;
    assert_eq!(bar.market, "BTC-LTC");
    assert_eq!(bar.volume, 1.0);
}
