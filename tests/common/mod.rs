//! In-memory upstream providers shared by the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use launch_risk_oracle::config::EngineConfig;
use launch_risk_oracle::oracle::{
    LaunchInfoProvider, LaunchRiskEngine, MarketStatsProvider, Providers, SnipeHistory, SwapEvent,
    SwapHistoryProvider, TokenLaunchInfo, TokenMarketStats, TokenTransfer, WalletIntelProvider,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MINT: &str = "LaunchMint1111111111111111111111111111111111";
pub const POOL: &str = "PoolAuthority11111111111111111111111111111111";

/// Scripted chain state with call counters
#[derive(Default)]
pub struct MockChain {
    pub swaps: Vec<SwapEvent>,
    pub market: Option<TokenMarketStats>,
    pub launch: Option<TokenLaunchInfo>,
    pub first_activity: HashMap<String, i64>,
    pub histories: HashMap<String, SnipeHistory>,
    pub balances: HashMap<String, f64>,
    pub latency: Duration,

    pub swap_calls: AtomicUsize,
    pub market_calls: AtomicUsize,
    pub launch_calls: AtomicUsize,
    pub wallet_calls: AtomicUsize,
}

impl MockChain {
    async fn respond(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub fn swap_calls(&self) -> usize {
        self.swap_calls.load(Ordering::SeqCst)
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn launch_calls(&self) -> usize {
        self.launch_calls.load(Ordering::SeqCst)
    }

    pub fn wallet_calls(&self) -> usize {
        self.wallet_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapHistoryProvider for MockChain {
    async fn recent_swaps(&self, _mint: &str, limit: usize) -> Result<Vec<SwapEvent>> {
        self.respond(&self.swap_calls).await;
        let skip = self.swaps.len().saturating_sub(limit);
        Ok(self.swaps[skip..].to_vec())
    }

    async fn launch_swaps(
        &self,
        _mint: &str,
        creation_slot: u64,
        max_blocks: u64,
        limit: usize,
    ) -> Result<Vec<SwapEvent>> {
        self.respond(&self.swap_calls).await;
        Ok(self
            .swaps
            .iter()
            .filter(|s| s.slot >= creation_slot && s.slot <= creation_slot + max_blocks)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MarketStatsProvider for MockChain {
    async fn market_stats(&self, mint: &str) -> Result<TokenMarketStats> {
        self.respond(&self.market_calls).await;
        match &self.market {
            Some(stats) => Ok(stats.clone()),
            None => bail!("no market listed for {}", mint),
        }
    }
}

#[async_trait]
impl LaunchInfoProvider for MockChain {
    async fn launch_info(&self, mint: &str) -> Result<TokenLaunchInfo> {
        self.respond(&self.launch_calls).await;
        match &self.launch {
            Some(launch) => Ok(launch.clone()),
            None => bail!("creation signature not found for {}", mint),
        }
    }
}

#[async_trait]
impl WalletIntelProvider for MockChain {
    async fn first_activity_ms(&self, wallet: &str) -> Result<Option<i64>> {
        self.respond(&self.wallet_calls).await;
        Ok(self.first_activity.get(wallet).copied())
    }

    async fn snipe_history(&self, wallet: &str) -> Result<Option<SnipeHistory>> {
        Ok(self.histories.get(wallet).cloned())
    }

    async fn token_balance(&self, wallet: &str, _mint: &str) -> Result<f64> {
        Ok(self.balances.get(wallet).copied().unwrap_or(0.0))
    }
}

pub fn engine_with(chain: Arc<MockChain>, config: EngineConfig) -> LaunchRiskEngine {
    let providers = Providers {
        swaps: chain.clone(),
        market: chain.clone(),
        launch: chain.clone(),
        wallets: chain,
    };
    LaunchRiskEngine::new(config, providers).unwrap()
}

pub fn engine(chain: Arc<MockChain>) -> LaunchRiskEngine {
    engine_with(chain, EngineConfig::default())
}

/// Pool-to-wallet transfer of `MINT`
pub fn buy(signature: &str, slot: u64, timestamp_ms: i64, wallet: &str, amount: f64) -> SwapEvent {
    SwapEvent {
        signature: signature.to_string(),
        timestamp_ms,
        slot,
        transfers: vec![TokenTransfer::new(MINT, POOL, wallet, amount)],
        account_keys: vec![wallet.to_string(), POOL.to_string()],
    }
}

/// Wallet-to-pool transfer of `MINT`
pub fn sell(signature: &str, slot: u64, timestamp_ms: i64, wallet: &str, amount: f64) -> SwapEvent {
    SwapEvent {
        signature: signature.to_string(),
        timestamp_ms,
        slot,
        transfers: vec![TokenTransfer::new(MINT, wallet, POOL, amount)],
        account_keys: vec![wallet.to_string(), POOL.to_string()],
    }
}

/// Direct wallet-to-wallet transfer of `MINT`
pub fn transfer(signature: &str, slot: u64, timestamp_ms: i64, from: &str, to: &str, amount: f64) -> SwapEvent {
    SwapEvent {
        signature: signature.to_string(),
        timestamp_ms,
        slot,
        transfers: vec![TokenTransfer::new(MINT, from, to, amount)],
        account_keys: vec![from.to_string(), to.to_string()],
    }
}

pub fn quiet_market() -> TokenMarketStats {
    TokenMarketStats {
        volume_24h: 50_000.0,
        price_change_24h: 25.0,
        holder_count: Some(800),
        liquidity_usd: 40_000.0,
        price_usd: Some(0.001),
    }
}
