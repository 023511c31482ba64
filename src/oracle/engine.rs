//! Launch Risk Engine
//!
//! Entry point consumed by scoring, sizing and alerting layers. Fetches
//! upstream data, runs the wash-trading and sniper detectors and memoizes the
//! verdicts.
//!
//! # Features
//! - Always returns a well-formed analysis: upstream failures become warnings
//!   and zero-risk defaults
//! - TTL caches with single-flight computation per key; verdicts built on
//!   partial data are cached like any other
//! - Cache-only quick reads that never touch the network
//! - Bounded batch analysis
//!
//! # Usage
//! ```no_run
//! use launch_risk_oracle::config::EngineConfig;
//! use launch_risk_oracle::oracle::engine::LaunchRiskEngine;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = LaunchRiskEngine::solana(EngineConfig::default())?;
//! let wash = engine.analyze_wash_trading("So11111111111111111111111111111111111111112").await;
//! println!("{}", wash.summary());
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::observability::EngineMetrics;
use crate::oracle::analysis_cache::{AnalysisCache, CacheMetricsSnapshot};
use crate::oracle::providers::{DexScreenerClient, Providers, SolanaRpcProvider};
use crate::oracle::sniper::{SniperAnalysis, SniperDetector, WalletSniperProfile};
use crate::oracle::types::{warning_codes, AnalysisWarning, Severity};
use crate::oracle::wash_trading::{WashTradingAnalysis, WashTradingDetector};
use crate::utils::retry::fetch_with_policy;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const WASH: &str = "wash";
const SNIPER: &str = "sniper";
const WALLET: &str = "wallet";

/// Hit/miss counters of the three caches
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineCacheStats {
    pub wash: CacheMetricsSnapshot,
    pub sniper: CacheMetricsSnapshot,
    pub wallet: CacheMetricsSnapshot,
}

pub struct LaunchRiskEngine {
    config: EngineConfig,
    providers: Providers,
    wash_detector: WashTradingDetector,
    sniper_detector: SniperDetector,
    wash_cache: AnalysisCache<WashTradingAnalysis>,
    sniper_cache: AnalysisCache<SniperAnalysis>,
    wallet_cache: AnalysisCache<WalletSniperProfile>,
    metrics: EngineMetrics,
}

impl LaunchRiskEngine {
    pub fn new(config: EngineConfig, providers: Providers) -> Result<Self> {
        config.validate()?;

        let wash_detector = WashTradingDetector::new(config.wash_trading.clone());
        let sniper_detector = SniperDetector::new(config.sniper.clone(), providers.wallets.clone(), config.fetch.clone());

        let cache = &config.cache;
        let wash_cache = AnalysisCache::new(WASH, cache.max_capacity, cache.token_ttl_secs);
        let sniper_cache = AnalysisCache::new(SNIPER, cache.max_capacity, cache.token_ttl_secs);
        let wallet_cache = AnalysisCache::new(WALLET, cache.max_capacity, cache.wallet_ttl_secs);

        info!(
            token_ttl_secs = cache.token_ttl_secs,
            wallet_ttl_secs = cache.wallet_ttl_secs,
            "Initialized LaunchRiskEngine"
        );

        Ok(Self {
            metrics: EngineMetrics::new()?,
            config,
            providers,
            wash_detector,
            sniper_detector,
            wash_cache,
            sniper_cache,
            wallet_cache,
        })
    }

    /// Engine wired to a Solana RPC node and DEX Screener
    pub fn solana(config: EngineConfig) -> Result<Self> {
        let rpc = Arc::new(SolanaRpcProvider::new(config.rpc.clone())?);
        let dex = Arc::new(DexScreenerClient::new(config.dex_screener.clone())?);
        Self::new(config, Providers::solana(rpc, dex))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub async fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            wash: self.wash_cache.get_metrics().await,
            sniper: self.sniper_cache.get_metrics().await,
            wallet: self.wallet_cache.get_metrics().await,
        }
    }

    fn upstream_failure(&self, call: &str, subject: &str, error: &anyhow::Error) -> AnalysisWarning {
        warn!(call, subject, "Upstream call failed: {:#}", error);
        self.metrics.record_upstream_failure(call);
        AnalysisWarning::new(
            warning_codes::UPSTREAM_UNAVAILABLE,
            format!("{} unavailable: {}", call, error),
            Severity::Medium,
        )
    }

    /// Wash-trading verdict for `token_mint`, cached for the token TTL
    #[instrument(skip(self))]
    pub async fn analyze_wash_trading(&self, token_mint: &str) -> WashTradingAnalysis {
        let (mut analysis, cached) = self
            .wash_cache
            .get_or_compute(token_mint, self.compute_wash_trading(token_mint))
            .await;
        self.metrics.record_cache_lookup(WASH, cached);

        analysis.cached = cached;
        analysis
    }

    async fn compute_wash_trading(&self, token_mint: &str) -> WashTradingAnalysis {
        let start = Instant::now();
        let policy = &self.config.fetch;
        let max_swaps = self.config.wash_trading.max_swaps;

        let (swaps, stats) = tokio::join!(
            fetch_with_policy(policy, "recent_swaps", || self.providers.swaps.recent_swaps(token_mint, max_swaps)),
            fetch_with_policy(policy, "market_stats", || self.providers.market.market_stats(token_mint)),
        );

        let mut upstream_warnings = Vec::new();
        let swaps = swaps.unwrap_or_else(|e| {
            upstream_warnings.push(self.upstream_failure("recent_swaps", token_mint, &e));
            Vec::new()
        });
        let stats = match stats {
            Ok(stats) => Some(stats),
            Err(e) => {
                upstream_warnings.push(self.upstream_failure("market_stats", token_mint, &e));
                None
            }
        };

        let mut analysis = self.wash_detector.analyze(token_mint, &swaps, stats.as_ref());
        analysis.warnings.extend(upstream_warnings);

        self.metrics.record_analysis(WASH, start.elapsed().as_secs_f64());
        analysis
    }

    /// Sniper/MEV verdict for `token_mint`, cached for the token TTL
    #[instrument(skip(self))]
    pub async fn analyze_snipers(&self, token_mint: &str) -> SniperAnalysis {
        let (mut analysis, cached) = self
            .sniper_cache
            .get_or_compute(token_mint, self.compute_snipers(token_mint))
            .await;
        self.metrics.record_cache_lookup(SNIPER, cached);

        analysis.cached = cached;
        analysis
    }

    /// The swap window is anchored on the creation slot, so swap history is
    /// only fetched once the launch is known.
    async fn compute_snipers(&self, token_mint: &str) -> SniperAnalysis {
        let start = Instant::now();
        let policy = &self.config.fetch;
        let sniper = &self.config.sniper;

        let launch = fetch_with_policy(policy, "launch_info", || self.providers.launch.launch_info(token_mint)).await;
        let analysis = match launch {
            Ok(launch) => {
                let swaps = fetch_with_policy(policy, "launch_swaps", || {
                    self.providers.swaps.launch_swaps(
                        token_mint,
                        launch.creation_slot,
                        sniper.max_blocks_from_launch,
                        sniper.max_swaps,
                    )
                })
                .await;

                match swaps {
                    Ok(swaps) => self.sniper_detector.analyze(token_mint, &swaps, &launch).await,
                    Err(e) => {
                        let mut analysis = SniperAnalysis::empty(token_mint);
                        analysis.creation_slot = Some(launch.creation_slot);
                        analysis.warnings.push(self.upstream_failure("launch_swaps", token_mint, &e));
                        analysis
                    }
                }
            }
            Err(e) => {
                let mut analysis = SniperAnalysis::empty(token_mint);
                analysis.warnings.push(self.upstream_failure("launch_info", token_mint, &e));
                analysis.warnings.push(AnalysisWarning::new(
                    warning_codes::CREATION_BLOCK_UNKNOWN,
                    format!("Creation block could not be determined: {}", e),
                    Severity::Medium,
                ));
                analysis
            }
        };

        self.metrics.record_analysis(SNIPER, start.elapsed().as_secs_f64());
        analysis
    }

    /// Sniper reputation of one wallet, cached for the wallet TTL
    #[instrument(skip(self))]
    pub async fn get_wallet_sniper_score(&self, wallet: &str) -> WalletSniperProfile {
        let (mut profile, cached) = self
            .wallet_cache
            .get_or_compute(wallet, async {
                let start = Instant::now();
                let profile = self.sniper_detector.wallet_profile(wallet).await;
                self.metrics.record_analysis(WALLET, start.elapsed().as_secs_f64());
                profile
            })
            .await;
        self.metrics.record_cache_lookup(WALLET, cached);

        profile.cached = cached;
        profile
    }

    /// Cached wash score only; `None` unless a fresh analysis exists
    pub async fn get_quick_wash_score(&self, token_mint: &str) -> Option<u8> {
        self.wash_cache.peek(token_mint).await.map(|a| a.wash_score)
    }

    /// Cached sniper analysis only; never triggers a fetch
    pub async fn get_quick_sniper_analysis(&self, token_mint: &str) -> Option<SniperAnalysis> {
        self.sniper_cache.peek(token_mint).await.map(|mut analysis| {
            analysis.cached = true;
            analysis
        })
    }

    /// Analyse many tokens with at most `max_concurrent` in flight; results
    /// follow the input order
    pub async fn analyze_wash_trading_batch(&self, mints: &[String], max_concurrent: usize) -> Vec<WashTradingAnalysis> {
        stream::iter(mints)
            .map(|mint| self.analyze_wash_trading(mint))
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    pub async fn analyze_snipers_batch(&self, mints: &[String], max_concurrent: usize) -> Vec<SniperAnalysis> {
        stream::iter(mints)
            .map(|mint| self.analyze_snipers(mint))
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    /// Drop both cached token analyses so the next call recomputes
    pub async fn invalidate_token(&self, token_mint: &str) {
        self.wash_cache.invalidate(token_mint).await;
        self.sniper_cache.invalidate(token_mint).await;
    }

    pub async fn invalidate_wallet(&self, wallet: &str) {
        self.wallet_cache.invalidate(wallet).await;
    }
}
