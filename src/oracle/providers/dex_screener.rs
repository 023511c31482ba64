//! DEX Screener market stats client
//!
//! Reads 24h volume, 24h price change, liquidity and USD price of the most
//! liquid Solana pair for a token from the public DEX Screener API.

use super::MarketStatsProvider;
use crate::oracle::types::TokenMarketStats;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Configuration for the DEX Screener client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DexScreenerConfig {
    /// DEX Screener API key (optional, for higher rate limits)
    pub api_key: Option<String>,
    /// Base URL for DEX Screener API
    pub base_url: String,
    /// API request timeout (seconds)
    pub api_timeout_secs: u64,
    /// Rate limit: requests per minute
    pub rate_limit_per_minute: u32,
    /// Chain id pairs must belong to
    pub chain_id: String,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.dexscreener.com/latest".to_string(),
            api_timeout_secs: 5,
            rate_limit_per_minute: 60,
            chain_id: "solana".to_string(),
        }
    }
}

/// DEX Screener API response for token pairs
#[derive(Debug, Clone, Deserialize)]
struct DexScreenerTokenResponse {
    pairs: Option<Vec<DexScreenerPair>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexScreenerPair {
    chain_id: String,
    pair_address: String,
    price_usd: Option<String>,
    #[serde(default)]
    volume: DexScreenerWindow,
    #[serde(default)]
    liquidity: DexScreenerLiquidity,
    #[serde(default)]
    price_change: DexScreenerWindow,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DexScreenerWindow {
    #[serde(default)]
    h24: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DexScreenerLiquidity {
    usd: Option<f64>,
}

/// Rate-limited DEX Screener client
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http_client: Client,
    rate_limiter: Arc<DirectRateLimiter>,
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let rate_limit =
            NonZeroU32::new(config.rate_limit_per_minute).ok_or_else(|| anyhow!("Rate limit must be non-zero"))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rate_limit)));

        info!(
            "Initialized DexScreenerClient with base_url={}, rate_limit={}/min",
            config.base_url, config.rate_limit_per_minute
        );

        Ok(Self {
            config,
            http_client,
            rate_limiter,
        })
    }

    pub fn config(&self) -> &DexScreenerConfig {
        &self.config
    }

    async fn fetch_pairs(&self, mint: &str) -> Result<Vec<DexScreenerPair>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/dex/tokens/{}", self.config.base_url, mint);
        let mut request = self.http_client.get(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("X-API-KEY", api_key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to DEX Screener")?;

        if !response.status().is_success() {
            return Err(anyhow!("DEX Screener API error: {}", response.status()));
        }

        let body: DexScreenerTokenResponse = response
            .json()
            .await
            .context("Failed to parse DEX Screener token response")?;

        Ok(body.pairs.unwrap_or_default())
    }
}

/// Most liquid pair on `chain_id`
fn select_pair<'a>(pairs: &'a [DexScreenerPair], chain_id: &str) -> Option<&'a DexScreenerPair> {
    pairs
        .iter()
        .filter(|p| p.chain_id == chain_id)
        .max_by(|a, b| {
            let la = a.liquidity.usd.unwrap_or(0.0);
            let lb = b.liquidity.usd.unwrap_or(0.0);
            la.total_cmp(&lb)
        })
}

fn pair_to_stats(pair: &DexScreenerPair) -> TokenMarketStats {
    TokenMarketStats {
        volume_24h: pair.volume.h24,
        price_change_24h: pair.price_change.h24,
        holder_count: None,
        liquidity_usd: pair.liquidity.usd.unwrap_or(0.0),
        price_usd: pair.price_usd.as_deref().and_then(|p| p.parse::<f64>().ok()),
    }
}

#[async_trait]
impl MarketStatsProvider for DexScreenerClient {
    /// Holder count is not published by DEX Screener and is left unknown
    #[instrument(skip(self))]
    async fn market_stats(&self, mint: &str) -> Result<TokenMarketStats> {
        let pairs = self.fetch_pairs(mint).await?;
        let pair = select_pair(&pairs, &self.config.chain_id)
            .ok_or_else(|| anyhow!("No {} pair listed for {}", self.config.chain_id, mint))?;

        debug!(pair = %pair.pair_address, "Selected most liquid pair");
        Ok(pair_to_stats(pair))
    }
}
