//! Sniper & MEV Detection Module
//!
//! Decides whether bots captured a token's launch and how likely they are to
//! dump on later buyers.
//!
//! # Pipeline
//! 1. First-N-block buyer extraction (launch window, precise amounts, Jito tips)
//! 2. Bounded-concurrency wallet enrichment (age, snipe record, holdings)
//! 3. Per-wallet and token-level scoring with red flags

pub mod enricher;
pub mod extractor;
pub mod scorer;
pub mod types;

pub use enricher::{EnrichmentReport, WalletEnricher, WalletEnrichment};
pub use extractor::{is_precise_amount, FirstBlockBuyerExtractor};
pub use scorer::{SniperScoreAggregator, SniperVerdict};
pub use types::*;

use crate::oracle::providers::WalletIntelProvider;
use crate::oracle::timeline::VenueDetection;
use crate::oracle::types::{warning_codes, AnalysisWarning, Severity, SwapEvent, TokenLaunchInfo};
use crate::oracle::wash_trading::default_excluded_wallets;
use crate::utils::retry::FetchPolicy;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Jito tip accounts on mainnet
pub const JITO_TIP_ACCOUNTS: [&str; 8] = [
    "96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5",
    "HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe",
    "Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY",
    "ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49",
    "DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh",
    "ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt",
    "DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL",
    "3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT",
];

/// Configuration for sniper detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SniperConfig {
    /// Maximum swap events fetched per analysis
    pub max_swaps: usize,

    /// Launch window: buys later than this many blocks are ignored
    pub max_blocks_from_launch: u64,

    /// Buyers at or under this many blocks are always snipers
    pub sniper_block_threshold: u64,

    /// Later buyers become snipers from this score up
    pub sniper_score_threshold: u8,

    /// Only the first N candidates are enriched
    pub max_enriched_wallets: usize,

    /// Enrichment lookups in flight at once
    pub max_concurrent_enrichment: usize,

    /// Wallets younger than this are new (days)
    pub new_wallet_age_days: f64,

    /// A trade closed within this long after entry is a fast exit (milliseconds)
    pub fast_exit_window_ms: i64,

    /// Fast exiters need more than this many closed trades
    pub fast_exit_min_trades: usize,

    /// ...and more than this share of them fast
    pub fast_exit_ratio: f64,

    /// `totalSniped` above this marks a serial sniper
    pub serial_sniper_min: u32,

    /// Tip accounts marking a Jito-bundled transaction
    pub jito_tip_accounts: Vec<String>,

    /// Known MEV bot wallets
    pub known_mev_bots: Vec<String>,

    /// Wallets never treated as buyers
    pub excluded_wallets: Vec<String>,

    /// Liquidity venue recognition
    pub venue_detection: VenueDetection,
}

impl Default for SniperConfig {
    fn default() -> Self {
        Self {
            max_swaps: 200,
            max_blocks_from_launch: 10,
            sniper_block_threshold: 5,
            sniper_score_threshold: 50,
            max_enriched_wallets: 20,
            max_concurrent_enrichment: 20,
            new_wallet_age_days: 7.0,
            fast_exit_window_ms: 60 * 60 * 1000,
            fast_exit_min_trades: 3,
            fast_exit_ratio: 0.5,
            serial_sniper_min: 5,
            jito_tip_accounts: JITO_TIP_ACCOUNTS.iter().map(|s| s.to_string()).collect(),
            known_mev_bots: Vec::new(),
            excluded_wallets: default_excluded_wallets(),
            venue_detection: VenueDetection::default(),
        }
    }
}

/// Extract, enrich and score launch-window buyers
pub struct SniperDetector {
    config: SniperConfig,
    extractor: FirstBlockBuyerExtractor,
    enricher: WalletEnricher,
    aggregator: SniperScoreAggregator,
}

impl SniperDetector {
    pub fn new(config: SniperConfig, wallets: Arc<dyn WalletIntelProvider>, fetch_policy: FetchPolicy) -> Self {
        let extractor = FirstBlockBuyerExtractor::new(
            config.max_blocks_from_launch,
            config.jito_tip_accounts.iter().cloned().collect(),
            config.excluded_wallets.iter().cloned().collect(),
            config.venue_detection.clone(),
        );
        let aggregator = SniperScoreAggregator::new(
            config.sniper_block_threshold,
            config.sniper_score_threshold,
            config.serial_sniper_min,
        );
        let enricher = WalletEnricher::new(wallets, config.clone(), fetch_policy);

        Self {
            config,
            extractor,
            enricher,
            aggregator,
        }
    }

    pub fn config(&self) -> &SniperConfig {
        &self.config
    }

    /// Analyse launch-window buying of `token_mint`
    pub async fn analyze(&self, token_mint: &str, swaps: &[SwapEvent], launch: &TokenLaunchInfo) -> SniperAnalysis {
        let start = Instant::now();
        let mut analysis = SniperAnalysis::empty(token_mint);
        analysis.creation_slot = Some(launch.creation_slot);

        let relevant: Vec<SwapEvent> = swaps
            .iter()
            .filter(|event| event.involves_mint(token_mint))
            .cloned()
            .collect();

        if relevant.is_empty() {
            analysis.warnings.push(AnalysisWarning::new(
                warning_codes::NO_SWAP_DATA,
                "No swap activity found for this token",
                Severity::Low,
            ));
            analysis.analysis_time_ms = start.elapsed().as_millis() as u64;
            return analysis;
        }

        let mut candidates = self.extractor.extract(token_mint, &relevant, launch);
        let report = self
            .enricher
            .enrich_candidates(&mut candidates, token_mint, launch.total_supply, Utc::now().timestamp_millis())
            .await;

        if report.failed_lookups > 0 {
            analysis.warnings.push(AnalysisWarning::new(
                warning_codes::ENRICHMENT_DEGRADED,
                format!(
                    "{} wallet lookups failed; affected wallets scored on launch data only",
                    report.failed_lookups
                ),
                Severity::Low,
            ));
        }

        let verdict = self.aggregator.aggregate(candidates);

        analysis.total_snipers = verdict.snipers.len();
        analysis.block0_buyers = verdict.block0_buyers;
        analysis.known_mev_bots = verdict.known_mev_bots;
        analysis.jito_bundled = verdict.jito_bundled;
        analysis.sniper_score = verdict.sniper_score;
        analysis.sniper_risk = verdict.sniper_risk;
        analysis.dump_probability = verdict.dump_probability;
        analysis.sniper_supply_percent = verdict.sniper_supply_percent;
        analysis.snipers = verdict.snipers;
        analysis.red_flags = verdict.red_flags;
        analysis.analysis_time_ms = start.elapsed().as_millis() as u64;

        info!(
            mint = token_mint,
            sniper_score = analysis.sniper_score,
            risk = analysis.sniper_risk.as_str(),
            snipers = analysis.total_snipers,
            block0 = analysis.block0_buyers,
            mev = analysis.known_mev_bots,
            elapsed_ms = analysis.analysis_time_ms,
            "Sniper analysis complete"
        );

        analysis
    }

    /// Reputation of one wallet as a launch sniper
    pub async fn wallet_profile(&self, wallet: &str) -> WalletSniperProfile {
        let enrichment = self
            .enricher
            .enrich_wallet(wallet, None, Utc::now().timestamp_millis())
            .await;
        let mut profile = self.aggregator.profile(wallet, &enrichment);

        if !enrichment.failed_lookups.is_empty() {
            profile.warnings.push(AnalysisWarning::new(
                warning_codes::UPSTREAM_UNAVAILABLE,
                format!("Lookups unavailable: {}", enrichment.failed_lookups.join(", ")),
                Severity::Medium,
            ));
        }
        if enrichment.win_rate.is_none() {
            profile.warnings.push(AnalysisWarning::new(
                warning_codes::INSUFFICIENT_DATA,
                "No closed-trade outcomes; win rate unavailable",
                Severity::Low,
            ));
        }

        profile
    }
}
