//! Upstream data providers
//!
//! The engine consumes four fallible data sources through these traits. Any
//! error is caught by the engine and replaced with a safe default, so
//! implementations should simply propagate failures with context.
//!
//! # Implementations
//! - [`SolanaRpcProvider`]: swap history, launch info, wallet intel and holder
//!   counts straight from a Solana RPC node
//! - [`DexScreenerClient`]: 24h volume, price change, liquidity and price
//! - [`CompositeMarketStats`]: DexScreener numbers plus the RPC holder count,
//!   which is left unknown when the node refuses the scan

pub mod dex_screener;
pub mod solana_rpc;

pub use dex_screener::{DexScreenerClient, DexScreenerConfig};
pub use solana_rpc::{RpcConfig, SolanaRpcProvider};

use crate::oracle::types::{SnipeHistory, SwapEvent, TokenLaunchInfo, TokenMarketStats};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Ordered swap history for a mint
#[async_trait]
pub trait SwapHistoryProvider: Send + Sync {
    /// Up to `limit` most recent swaps, ordered oldest to newest
    async fn recent_swaps(&self, mint: &str, limit: usize) -> Result<Vec<SwapEvent>>;

    /// Up to `limit` of the earliest swaps landing in
    /// `creation_slot..=creation_slot + max_blocks`, ordered oldest to newest.
    /// Unlike [`recent_swaps`](Self::recent_swaps) this reaches the launch
    /// window however much the token has traded since.
    async fn launch_swaps(
        &self,
        mint: &str,
        creation_slot: u64,
        max_blocks: u64,
        limit: usize,
    ) -> Result<Vec<SwapEvent>>;
}

/// Market statistics for a mint
#[async_trait]
pub trait MarketStatsProvider: Send + Sync {
    async fn market_stats(&self, mint: &str) -> Result<TokenMarketStats>;
}

/// Number of distinct wallets holding a mint
#[async_trait]
pub trait HolderCountProvider: Send + Sync {
    async fn holder_count(&self, mint: &str) -> Result<u64>;
}

/// Creation-block lookup
#[async_trait]
pub trait LaunchInfoProvider: Send + Sync {
    async fn launch_info(&self, mint: &str) -> Result<TokenLaunchInfo>;
}

/// Wallet-level intelligence used to enrich sniper candidates
#[async_trait]
pub trait WalletIntelProvider: Send + Sync {
    /// Earliest observed activity of the wallet (unix ms), `None` if it has none
    async fn first_activity_ms(&self, wallet: &str) -> Result<Option<i64>>;

    /// Prior sniping record, `None` when no performance source is wired in
    async fn snipe_history(&self, wallet: &str) -> Result<Option<SnipeHistory>>;

    /// Current balance of `mint` held by `wallet` (UI units)
    async fn token_balance(&self, wallet: &str, mint: &str) -> Result<f64>;
}

/// The upstream handles an engine instance works against
#[derive(Clone)]
pub struct Providers {
    pub swaps: Arc<dyn SwapHistoryProvider>,
    pub market: Arc<dyn MarketStatsProvider>,
    pub launch: Arc<dyn LaunchInfoProvider>,
    pub wallets: Arc<dyn WalletIntelProvider>,
}

impl Providers {
    /// Wire every role to the on-chain provider, with market stats from
    /// DexScreener combined with on-chain holder counts.
    pub fn solana(rpc: Arc<SolanaRpcProvider>, dex: Arc<DexScreenerClient>) -> Self {
        Self {
            swaps: rpc.clone(),
            market: Arc::new(CompositeMarketStats::new(dex, rpc.clone())),
            launch: rpc.clone(),
            wallets: rpc,
        }
    }
}

/// Market numbers from one provider with the holder count from another.
///
/// A failed holder lookup keeps the market numbers and reports the holder
/// count as unknown; only a failed market lookup fails the call.
pub struct CompositeMarketStats {
    market: Arc<dyn MarketStatsProvider>,
    holders: Arc<dyn HolderCountProvider>,
}

impl CompositeMarketStats {
    pub fn new(market: Arc<dyn MarketStatsProvider>, holders: Arc<dyn HolderCountProvider>) -> Self {
        Self { market, holders }
    }
}

#[async_trait]
impl MarketStatsProvider for CompositeMarketStats {
    async fn market_stats(&self, mint: &str) -> Result<TokenMarketStats> {
        let (stats, holders) = tokio::join!(self.market.market_stats(mint), self.holders.holder_count(mint));

        let mut stats = stats.context("DexScreener market stats")?;
        stats.holder_count = match holders {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(mint, "Holder count unavailable: {:#}", e);
                None
            }
        };
        Ok(stats)
    }
}
