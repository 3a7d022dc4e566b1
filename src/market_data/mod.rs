pub mod aggregator;

// Re-export for convenient access (e.g. `use crate::market_data::Candle`).
pub use aggregator::{BarSink, Candle, CandleAggregator};
