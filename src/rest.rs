// =============================================================================
// Bittrex public REST API client
// =============================================================================
//
// Every endpoint wraps its payload in a `{success, message, result}` envelope.
// `result` can be null even when `success` is true (GetTicks does this for
// thin markets), so envelope unwrapping and result decoding are separate
// steps. Signed account endpoints are not part of this client.
// =============================================================================

use anyhow::{Context, Result};
use tracing::debug;

use crate::types::{Market, Tick};

const DEFAULT_HOST: &str = "https://bittrex.com";

/// HTTP client for the exchange's public REST endpoints.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    http: reqwest::Client,
}

impl RestClient {
    pub fn new() -> Self {
        Self::with_host(DEFAULT_HOST)
    }

    /// Point the client at a different host (used against test servers).
    pub fn with_host(host: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: host.into(),
            http,
        }
    }

    /// GET /api/v1.1/public/getmarkets — all markets traded on the exchange.
    pub async fn markets(&self) -> Result<Vec<Market>> {
        let url = format!("{}/api/v1.1/public/getmarkets", self.base_url);
        let body = self.get_text(&url).await?;

        let result = unwrap_envelope(&body)?.context("getmarkets returned no result")?;
        let markets: Vec<Market> =
            serde_json::from_value(result).context("json decode of markets failed")?;

        debug!(count = markets.len(), "markets fetched");
        Ok(markets)
    }

    /// GET /Api/v2.0/pub/market/GetTicks — about ten days of one-minute
    /// candles for `market`.
    ///
    /// The response usually misses the last few minutes, so live trade data
    /// is still needed for up-to-the-minute candles; this endpoint works as
    /// the backfill and source of truth for earlier windows.
    pub async fn ticks(&self, market: &str) -> Result<Vec<Tick>> {
        let url = format!(
            "{}/Api/v2.0/pub/market/GetTicks?marketName={}&tickInterval=oneMin",
            self.base_url, market
        );
        let body = self.get_text(&url).await?;

        // A null result still counts as success here:
        // {"success":true,"message":"","result":null}
        let ticks: Vec<Tick> = match unwrap_envelope(&body)? {
            Some(result) => serde_json::from_value(result).context("json decode of ticks failed")?,
            None => Vec::new(),
        };

        debug!(market, count = ticks.len(), "ticks fetched");
        Ok(ticks)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read response body")?;

        if !status.is_success() {
            anyhow::bail!("GET {url} returned {status}: {body}");
        }
        Ok(body)
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, serde::Deserialize)]
struct RestEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    result: Option<serde_json::Value>,
}

/// Parse the standard response envelope and return the inner result, which
/// may legitimately be absent.
fn unwrap_envelope(body: &str) -> Result<Option<serde_json::Value>> {
    let envelope: RestEnvelope =
        serde_json::from_str(body).context("json decode of response envelope failed")?;

    if !envelope.success {
        anyhow::bail!("api call was not successful: {}", envelope.message);
    }

    // serde maps JSON null to None as well, so both a missing and a null
    // result land here.
    Ok(envelope.result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
