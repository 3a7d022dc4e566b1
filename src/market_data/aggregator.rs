// =============================================================================
// Candle Aggregator — folds the live trade feed into per-market OHLCV bars
// =============================================================================
//
// One in-progress candle per market. Trades fold in under a short map lock;
// a fixed-interval ticker flushes every candle to the caller's sink and
// reseeds the window from the last close, so a quiet market keeps emitting
// degenerate bars (O=H=L=C=last close, V=0) once it has traded at all.
//
// The lock is never held across a sink invocation: each flushed bar is handed
// to the sink on its own task, so a slow sink cannot stall trade ingestion or
// the next tick.
// =============================================================================

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dispatcher::TradeDispatcher;
use crate::types::Trade;

/// A fixed-interval OHLCV summary of one market's trading activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub market: String,
    /// Instant at which this candle's window opened.
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl std::fmt::Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}|O:{:.8}|H:{:.8}|L:{:.8}|C:{:.8}|V:{:.8}",
            self.market,
            self.time.to_rfc3339(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume
        )
    }
}

/// Caller-supplied handler invoked once per market per flushed window.
pub type BarSink = Arc<dyn Fn(Candle) + Send + Sync + 'static>;

/// In-progress accumulator for the current window of one market.
#[derive(Debug, Clone)]
struct Accumulator {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    /// Distinguishes "open not yet observed" from a genuine 0.0 price, so a
    /// zero-priced market cannot have its open silently rewritten.
    open_set: bool,
}

impl Accumulator {
    fn from_trade(trade: &Trade) -> Self {
        Self {
            open: trade.price,
            high: trade.price,
            low: trade.price,
            close: trade.price,
            volume: trade.quantity,
            open_set: true,
        }
    }

    fn fold(&mut self, trade: &Trade) {
        if !self.open_set {
            self.open = trade.price;
            self.open_set = true;
        }
        // Strict comparisons: a price equal to the running high or low leaves
        // it untouched.
        if trade.price > self.high {
            self.high = trade.price;
        }
        if trade.price < self.low {
            self.low = trade.price;
        }
        self.close = trade.price;
        self.volume += trade.quantity;
    }

    /// Carry the window over: the next window opens at this one's close with
    /// no volume yet.
    fn reseed(&mut self) {
        self.open = self.close;
        self.high = self.close;
        self.low = self.close;
        self.volume = 0.0;
        self.open_set = true;
    }

    fn snapshot(&self, market: &str, time: DateTime<Utc>) -> Candle {
        Candle {
            market: market.to_string(),
            time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Folds trades into per-market candles and flushes them to a sink on a
/// fixed wall-clock cadence.
///
/// The aggregator exclusively owns the market → candle mapping. `on_trade`
/// and `on_tick` contend only on the brief map operation itself, never on
/// downstream work.
pub struct CandleAggregator {
    interval: Duration,
    /// `interval` as a chrono duration, for stamping window-open times.
    window: chrono::Duration,
    candles: Mutex<HashMap<String, Accumulator>>,
    sink: BarSink,
}

impl CandleAggregator {
    /// Create an aggregator that flushes one candle per market to `sink`
    /// every `interval`. The interval is fixed for the aggregator's lifetime.
    pub fn new<F>(interval: Duration, sink: F) -> Arc<Self>
    where
        F: Fn(Candle) + Send + Sync + 'static,
    {
        Arc::new(Self {
            interval,
            window: chrono::Duration::from_std(interval)
                .expect("candle interval out of range"),
            candles: Mutex::new(HashMap::new()),
            sink: Arc::new(sink),
        })
    }

    /// Fold one trade into its market's in-progress candle.
    ///
    /// Safe to call concurrently; folds for the same market serialize under
    /// the map lock, which is held only for the insert-or-update itself.
    pub fn on_trade(&self, trade: &Trade) {
        let mut candles = self.candles.lock();
        match candles.entry(trade.market()) {
            Entry::Occupied(mut entry) => entry.get_mut().fold(trade),
            Entry::Vacant(entry) => {
                entry.insert(Accumulator::from_trade(trade));
            }
        }
    }

    /// Flush the window that ends at `now`.
    ///
    /// Every market that has ever traded gets exactly one candle, stamped
    /// with the window's open instant (`now` minus the interval), and its
    /// accumulator is reseeded from the close. Sink invocations are spawned
    /// after the lock is released, one task per market.
    pub fn on_tick(&self, now: DateTime<Utc>) {
        let opened_at = now - self.window;

        let flushed: Vec<Candle> = {
            let mut candles = self.candles.lock();
            candles
                .iter_mut()
                .map(|(market, acc)| {
                    let bar = acc.snapshot(market, opened_at);
                    acc.reseed();
                    bar
                })
                .collect()
        };

        debug!(markets = flushed.len(), "flushing candle window");
        for bar in flushed {
            let sink = self.sink.clone();
            tokio::spawn(async move {
                sink(bar);
            });
        }
    }

    /// Subscribe to `dispatcher` and start the flush ticker.
    ///
    /// The ticker runs for the life of the process; there is no shutdown
    /// handle for the aggregator itself.
    pub fn attach(self: &Arc<Self>, dispatcher: &TradeDispatcher) {
        let agg = self.clone();
        dispatcher.register(move |trade| agg.on_trade(&trade));

        let agg = self.clone();
        info!(interval = ?agg.interval, "candle aggregator attached");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(agg.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so flushes
            // only happen on window boundaries.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                agg.on_tick(Utc::now());
            }
        });
    }

    /// Number of markets currently carrying a candle.
    pub fn market_count(&self) -> usize {
        self.candles.lock().len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
