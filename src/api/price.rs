//! Spot-price lookup against the Coinbase public API.
//!
//! Best effort only: any failure degrades to a zero price so the user can
//! still type a price by hand. No retries.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

const PRICE_API_BASE: &str = "https://api.coinbase.com/v2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shorthand tickers that do not resolve with the plain `-USD` suffix.
const SYMBOL_ALIASES: &[(&str, &str)] = &[
    ("BTC/USDT", "BTC-USD"),
    ("ETH/USDT", "ETH-USD"),
    ("SOL/USDT", "SOL-USD"),
    ("XAU", "PAXG-USD"),
    ("GOLD", "PAXG-USD"),
];

/// Result of a lookup. `price` is zero when the lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub price: Decimal,
    pub resolved_symbol: String,
}

#[derive(Debug, Deserialize)]
struct SpotPriceResponse {
    data: SpotPrice,
}

#[derive(Debug, Deserialize)]
struct SpotPrice {
    amount: Decimal,
}

/// Client for the spot-price endpoint.
pub struct PriceClient {
    client: Client,
    base_url: String,
}

impl PriceClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: PRICE_API_BASE.to_string(),
        })
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Map a user-typed ticker to an instrument code the API resolves.
    pub fn resolve_symbol(symbol: &str) -> String {
        let ticker = symbol.trim().to_uppercase();

        for (alias, code) in SYMBOL_ALIASES {
            if ticker == *alias {
                return (*code).to_string();
            }
        }

        if ticker.contains('-') {
            ticker
        } else if let Some((base, _quote)) = ticker.split_once('/') {
            format!("{base}-USD")
        } else {
            format!("{ticker}-USD")
        }
    }

    /// Look up the live price for a ticker. Never fails: unknown symbols,
    /// network errors and parse errors all come back as a zero-price quote
    /// carrying the original symbol.
    pub async fn lookup(&self, symbol: &str) -> PriceQuote {
        let resolved = Self::resolve_symbol(symbol);

        match self.fetch_spot(&resolved).await {
            Ok(price) => {
                debug!(symbol = %resolved, price = %price, "price resolved");
                PriceQuote {
                    price,
                    resolved_symbol: resolved,
                }
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "price lookup failed, using placeholder");
                PriceQuote {
                    price: Decimal::ZERO,
                    resolved_symbol: symbol.trim().to_uppercase(),
                }
            }
        }
    }

    async fn fetch_spot(&self, instrument: &str) -> Result<Decimal> {
        let url = format!("{}/prices/{}/spot", self.base_url, instrument);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to fetch spot price")?;

        if !response.status().is_success() {
            anyhow::bail!("spot price request failed: {}", response.status());
        }

        let body: SpotPriceResponse = response
            .json()
            .await
            .context("failed to parse spot price response")?;

        Ok(body.data.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_take_priority() {
        assert_eq!(PriceClient::resolve_symbol("btc/usdt"), "BTC-USD");
        assert_eq!(PriceClient::resolve_symbol("GOLD"), "PAXG-USD");
    }

    #[test]
    fn unmapped_tickers_get_usd_suffix() {
        assert_eq!(PriceClient::resolve_symbol("sol"), "SOL-USD");
        assert_eq!(PriceClient::resolve_symbol(" LINK "), "LINK-USD");
        assert_eq!(PriceClient::resolve_symbol("AVAX/EUR"), "AVAX-USD");
    }

    #[test]
    fn explicit_pairs_pass_through() {
        assert_eq!(PriceClient::resolve_symbol("ETH-EUR"), "ETH-EUR");
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_zero() {
        let client =
            PriceClient::with_base_url("http://127.0.0.1:1/v2".to_string()).expect("client");
        let quote = client.lookup("btc").await;

        assert_eq!(quote.price, Decimal::ZERO);
        assert_eq!(quote.resolved_symbol, "BTC");
    }
}
