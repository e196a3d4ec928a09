use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

const COINBASE_URL: &str = "https://api.exchange.coinbase.com/products/ETH-USD/trades";
const CACHE_TTL: Duration = Duration::from_secs(600);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct CoinbaseTrade {
    price: String,
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: f64,
    fetched_at: Instant,
}

/// Cached ETH-USD quote from the Coinbase exchange API.
///
/// Entirely optional: every failure degrades to 0.0 so a price outage never
/// disturbs the slot loop.
pub struct PriceFetcher {
    http: reqwest::Client,
    cache: RwLock<Option<CachedPrice>>,
}

impl Default for PriceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            cache: RwLock::new(None),
        }
    }

    /// Current ETH price in USD, cached for ten minutes. Returns 0.0 when no
    /// quote is available.
    pub async fn get_eth_price(&self) -> f64 {
        if let Some(cached) = *self.cache.read() {
            if cached.fetched_at.elapsed() < CACHE_TTL && cached.price > 0.0 {
                return cached.price;
            }
        }

        let price = self.fetch_price().await;

        *self.cache.write() = Some(CachedPrice {
            price,
            fetched_at: Instant::now(),
        });

        price
    }

    async fn fetch_price(&self) -> f64 {
        let response = match self
            .http
            .get(COINBASE_URL)
            .query(&[("limit", "1")])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "failed to fetch ETH price");
                return 0.0;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "price API returned non-success status");
            return 0.0;
        }

        let trades: Vec<CoinbaseTrade> = match response.json().await {
            Ok(trades) => trades,
            Err(e) => {
                debug!(error = %e, "failed to decode price response");
                return 0.0;
            }
        };

        let Some(trade) = trades.first() else {
            debug!("price API returned no trades");
            return 0.0;
        };

        match trade.price.parse::<f64>() {
            Ok(price) => {
                debug!(price, "fetched ETH price");
                price
            }
            Err(e) => {
                debug!(error = %e, raw = %trade.price, "failed to parse ETH price");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_price_decodes() {
        let raw = r#"[{"trade_id": 1, "price": "3150.42", "size": "0.1", "time": "t", "side": "buy"}]"#;
        let trades: Vec<CoinbaseTrade> = serde_json::from_str(raw).expect("should decode");
        assert_eq!(trades[0].price, "3150.42");
        assert!((trades[0].price.parse::<f64>().expect("parses") - 3150.42).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let fetcher = PriceFetcher::new();

        *fetcher.cache.write() = Some(CachedPrice {
            price: 1234.5,
            fetched_at: Instant::now(),
        });

        // A fresh cache entry is served without touching the network.
        assert_eq!(fetcher.get_eth_price().await, 1234.5);
    }
}
