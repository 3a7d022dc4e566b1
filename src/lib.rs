// =============================================================================
// Bittrex exchange client
// =============================================================================

//! Client library for the Bittrex exchange: public REST market data plus a
//! live trade feed with per-market OHLCV candle aggregation.
//!
//! The heart of the crate is the dispatcher → aggregator pipeline. A feed
//! transport (owned by the caller) pushes decoded [`Trade`] values into a
//! [`TradeDispatcher`]; a [`CandleAggregator`] subscribes to it, folds trades
//! into one in-progress candle per market, and flushes a finalized
//! [`Candle`] per market to a caller-supplied sink on a fixed cadence:
//!
//! ```no_run
//! use std::time::Duration;
//! use bittrex::{feed, CandleAggregator, TradeDispatcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = TradeDispatcher::new();
//!     let aggregator = CandleAggregator::new(Duration::from_secs(60), |bar| {
//!         println!("{bar}");
//!     });
//!     aggregator.attach(&dispatcher);
//!
//!     // For each payload the feed transport delivers:
//!     let payload = r#"{"MarketName":"BTC-LTC","Fills":[]}"#;
//!     feed::dispatch_exchange_update(&dispatcher, payload)?;
//!     Ok(())
//! }
//! ```

pub mod dispatcher;
pub mod feed;
pub mod market_data;
pub mod rest;
pub mod types;

pub use dispatcher::TradeDispatcher;
pub use market_data::{BarSink, Candle, CandleAggregator};
pub use rest::RestClient;
pub use types::{Market, Tick, Trade, TradeSide};
