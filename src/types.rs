// =============================================================================
// Shared types for the Bittrex client — trades, markets, historical ticks
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the market a trade took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A single executed trade delivered by the exchange feed.
///
/// Trades carry no identity: if the upstream feed redelivers one, the
/// aggregator folds it again. Deduplication is an upstream concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub base_currency: String,
    pub market_currency: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    /// Exchange-reported execution time. No ordering guarantee across trades.
    pub time: DateTime<Utc>,
}

impl Trade {
    /// Market identifier in the exchange's `BASE-MARKET` notation,
    /// e.g. `BTC-LTC`.
    pub fn market(&self) -> String {
        format!("{}-{}", self.base_currency, self.market_currency)
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} | {} | quantity: {:.8} | price: {:.8}",
            self.market(),
            self.side,
            self.time.to_rfc3339(),
            self.quantity,
            self.price
        )
    }
}

/// One market listing row from `public/getmarkets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Market {
    pub market_currency: String,
    pub base_currency: String,
    pub market_currency_long: String,
    pub base_currency_long: String,
    pub min_trade_size: f64,
    pub market_name: String,
    pub is_active: bool,
    pub created: String,
    pub notice: Option<String>,
    pub is_sponsored: Option<bool>,
    #[serde(rename = "LogoUrl")]
    pub logo_url: Option<String>,
}

/// One historical candle row from `pub/market/GetTicks`.
///
/// The exchange uses single-letter field names on the wire:
///
/// ```json
/// {
///   "O": 0.00061830,
///   "H": 0.00061830,
///   "L": 0.00061798,
///   "C": 0.00061798,
///   "V": 1220.69744635,
///   "T": "2017-11-17T16:51:00",
///   "BV": 0.75448216
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    #[serde(rename = "O")]
    pub open: f64,
    #[serde(rename = "H")]
    pub high: f64,
    #[serde(rename = "L")]
    pub low: f64,
    #[serde(rename = "C")]
    pub close: f64,
    #[serde(rename = "V")]
    pub volume: f64,
    /// Raw timestamp string; no zone suffix, UTC implied. See [`Tick::time`].
    #[serde(rename = "T")]
    pub timestamp: String,
    #[serde(rename = "BV", default)]
    pub base_volume: f64,
}

impl Tick {
    /// Parse the exchange timestamp into a proper UTC time.
    pub fn time(&self) -> Result<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S")
            .with_context(|| format!("failed to parse tick timestamp '{}'", self.timestamp))?;
        Ok(naive.and_utc())
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: O:{:.8}, H:{:.8}, L:{:.8}, C:{:.8}, V:{:.8}",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
