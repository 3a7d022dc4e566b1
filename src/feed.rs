// =============================================================================
// Exchange feed decoding — market delta payloads into Trade values
// =============================================================================
//
// The push feed delivers `updateExchangeState` deltas per market. Only the
// fills matter here; order-book deltas in the same payload are ignored. The
// transport that carries these payloads lives outside this crate — callers
// hand the raw JSON text to this module.
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::dispatcher::TradeDispatcher;
use crate::types::{Trade, TradeSide};

/// One `updateExchangeState` delta as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExchangeUpdate {
    market_name: String,
    #[serde(default)]
    fills: Vec<Fill>,
}

/// An executed trade inside an exchange update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Fill {
    order_type: String,
    rate: f64,
    quantity: f64,
    time_stamp: String,
}

/// Decode one exchange update payload into the trades it contains.
///
/// Any malformed field fails the whole payload; partial decodes are never
/// returned.
pub fn decode_exchange_update(payload: &str) -> Result<Vec<Trade>> {
    let update: ExchangeUpdate =
        serde_json::from_str(payload).context("failed to parse exchange update JSON")?;

    let (base, market) = split_market_name(&update.market_name)?;

    let mut trades = Vec::with_capacity(update.fills.len());
    for fill in &update.fills {
        let side = match fill.order_type.as_str() {
            "BUY" => TradeSide::Buy,
            "SELL" => TradeSide::Sell,
            other => anyhow::bail!("invalid trade side: {other}"),
        };

        trades.push(Trade {
            base_currency: base.to_string(),
            market_currency: market.to_string(),
            side,
            price: fill.rate,
            quantity: fill.quantity,
            time: parse_fill_time(&fill.time_stamp)?,
        });
    }

    Ok(trades)
}

/// Decode `payload` and forward every fill to `dispatcher`.
///
/// Returns the number of trades dispatched.
pub fn dispatch_exchange_update(dispatcher: &TradeDispatcher, payload: &str) -> Result<usize> {
    let trades = decode_exchange_update(payload)?;
    for trade in &trades {
        dispatcher.dispatch(trade);
    }
    debug!(count = trades.len(), "exchange update dispatched");
    Ok(trades.len())
}

/// Split a `BASE-MARKET` name into its two currencies.
fn split_market_name(name: &str) -> Result<(&str, &str)> {
    name.split_once('-')
        .with_context(|| format!("malformed market name '{name}'"))
}

/// Fill timestamps carry up to millisecond precision and no zone suffix
/// (UTC implied), e.g. `2017-11-17T16:51:00.88`.
fn parse_fill_time(ts: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("failed to parse fill timestamp '{ts}'"))?;
    Ok(naive.and_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
