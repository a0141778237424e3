use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use common::{AgentError, RetryPolicy};

use super::SnapshotSource;
use crate::models::{CoinMarket, CoinSnapshot, MarketSnapshot};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    tracked_ids: String,
    retry: RetryPolicy,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, tracked_ids: &str, retry: RetryPolicy) -> Result<Self, AgentError> {
        Ok(Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tracked_ids: tracked_ids.to_string(),
            retry,
        })
    }

    async fn fetch_markets(&self) -> Result<Vec<CoinMarket>, AgentError> {
        let url = format!("{}/coins/markets", self.base_url);
        let params: &[(&str, &str)] = &[
            ("vs_currency", "usd"),
            ("ids", self.tracked_ids.as_str()),
            ("order", "market_cap_desc"),
            ("per_page", "2"),
            ("page", "1"),
            ("sparkline", "false"),
            ("price_change_percentage", "1h,24h,7d"),
        ];

        let response = self
            .client
            .get(&url)
            .query(params)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Api(format!(
                "CoinGecko API error: {status} - {text}"
            )));
        }

        let markets: Vec<CoinMarket> = response.json().await?;
        debug!(coins = markets.len(), "markets payload received");
        Ok(markets)
    }
}

#[async_trait]
impl SnapshotSource for CoinGeckoClient {
    async fn fetch(&self) -> Result<MarketSnapshot, AgentError> {
        let snapshot = self
            .retry
            .run("coingecko markets", || async move {
                let markets = self.fetch_markets().await?;
                snapshot_from_markets(markets)
            })
            .await?;

        info!(
            btc = snapshot.bitcoin.current_price,
            eth = snapshot.ethereum.current_price,
            "fetched market snapshot"
        );
        Ok(snapshot)
    }
}

/// Index the markets payload by upper-cased symbol and require the tracked
/// pair. A payload without both coins is a shape failure, not a transient
/// one, so it skips the retry budget.
pub fn snapshot_from_markets(markets: Vec<CoinMarket>) -> Result<MarketSnapshot, AgentError> {
    let mut by_symbol: HashMap<String, CoinMarket> = markets
        .into_iter()
        .map(|coin| (coin.symbol.to_uppercase(), coin))
        .collect();

    let bitcoin = by_symbol
        .remove("BTC")
        .ok_or_else(|| AgentError::DataShape("missing BTC in markets payload".into()))?;
    let ethereum = by_symbol
        .remove("ETH")
        .ok_or_else(|| AgentError::DataShape("missing ETH in markets payload".into()))?;

    Ok(MarketSnapshot {
        bitcoin: coin_snapshot(bitcoin),
        ethereum: coin_snapshot(ethereum),
    })
}

fn coin_snapshot(coin: CoinMarket) -> CoinSnapshot {
    CoinSnapshot {
        id: coin.id,
        symbol: coin.symbol.to_uppercase(),
        current_price: coin.current_price,
        price_change_pct_24h: coin.price_change_24h.unwrap_or_default(),
        total_volume: coin.total_volume,
    }
}
