//! Wash Trading Detection Module
//!
//! Decides whether a token's reported volume is fake.
//!
//! # Detectors
//! - Self-trades: same-wallet buy→sell round trips inside a short window
//! - Circular patterns: tokens passed around a ring of 3-4 wallets
//! - Interval regularity: bot-like trade cadence
//! - Volume anomaly: volume out of line with price impact and holder count
//!
//! The detectors run on an immutable snapshot of swap events; fetching and
//! caching live in [`crate::oracle::engine`].

pub mod circular;
pub mod interval;
pub mod scorer;
pub mod self_trade;
pub mod types;
pub mod volume;

pub use circular::{CircularPattern, CircularPatternDetector, TransferGraph, MAX_CYCLE_WALLETS};
pub use interval::{IntervalAnomaly, IntervalRegularityAnalyzer};
pub use scorer::{WashScore, WashScoreAggregator, WashScoreInputs};
pub use self_trade::{SelfTrade, SelfTradeDetector};
pub use types::*;
pub use volume::{VolumeAnomalyAnalyzer, VolumeAnomalyData};

use crate::oracle::timeline::{build_timelines, VenueDetection};
use crate::oracle::types::{warning_codes, AnalysisWarning, Severity, SwapEvent, TokenMarketStats};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// Configuration for wash-trading detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WashTradingConfig {
    /// Maximum swap events fetched per analysis
    pub max_swaps: usize,

    /// Round trips faster than this count as self-trades (milliseconds)
    pub self_trade_window_ms: i64,

    /// Shortest accepted cycle (distinct wallets)
    pub min_cycle_length: usize,

    /// Longest accepted cycle, also the DFS depth bound (at most 4)
    pub max_cycle_length: usize,

    /// Patterns kept after ranking by confidence
    pub max_circular_patterns: usize,

    /// Cycles completing faster than this earn the speed bonus (milliseconds)
    pub fast_cycle_ms: i64,

    /// Minimum timestamped events before interval analysis runs
    pub min_interval_transactions: usize,

    /// Wallets never treated as traders (programs, burn addresses, AMM authorities)
    pub excluded_wallets: Vec<String>,

    /// Liquidity venue recognition
    pub venue_detection: VenueDetection,
}

impl Default for WashTradingConfig {
    fn default() -> Self {
        Self {
            max_swaps: 200,
            self_trade_window_ms: 5 * 60 * 1000,
            min_cycle_length: 3,
            max_cycle_length: 4,
            max_circular_patterns: 20,
            fast_cycle_ms: 10 * 60 * 1000,
            min_interval_transactions: 10,
            excluded_wallets: default_excluded_wallets(),
            venue_detection: VenueDetection::default(),
        }
    }
}

/// System accounts that move tokens without trading them
pub fn default_excluded_wallets() -> Vec<String> {
    [
        "11111111111111111111111111111111",
        "1nc1nerator11111111111111111111111111111111",
        "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
        "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Runs the four detectors over a swap snapshot and aggregates the verdict
#[derive(Debug, Clone)]
pub struct WashTradingDetector {
    config: WashTradingConfig,
    self_trades: SelfTradeDetector,
    circular: CircularPatternDetector,
    interval: IntervalRegularityAnalyzer,
    volume: VolumeAnomalyAnalyzer,
    aggregator: WashScoreAggregator,
}

impl WashTradingDetector {
    pub fn new(config: WashTradingConfig) -> Self {
        Self {
            self_trades: SelfTradeDetector::new(config.self_trade_window_ms),
            circular: CircularPatternDetector::new(
                config.min_cycle_length,
                config.max_cycle_length,
                config.max_circular_patterns,
                config.fast_cycle_ms,
            ),
            interval: IntervalRegularityAnalyzer::new(config.min_interval_transactions),
            volume: VolumeAnomalyAnalyzer::new(),
            aggregator: WashScoreAggregator::new(),
            config,
        }
    }

    pub fn config(&self) -> &WashTradingConfig {
        &self.config
    }

    /// Analyse `swaps` for `token_mint`.
    ///
    /// `stats` is `None` when the market-stats provider was unavailable; the
    /// volume detector is skipped in that case.
    pub fn analyze(
        &self,
        token_mint: &str,
        swaps: &[SwapEvent],
        stats: Option<&TokenMarketStats>,
    ) -> WashTradingAnalysis {
        let start = Instant::now();

        let relevant: Vec<SwapEvent> = swaps
            .iter()
            .filter(|event| event.involves_mint(token_mint))
            .cloned()
            .collect();

        let mut excluded: HashSet<String> = self.config.excluded_wallets.iter().cloned().collect();
        let venues = self.config.venue_detection.detect(&relevant, token_mint);
        if !venues.is_empty() {
            debug!(venues = ?venues, "Excluding liquidity venues from trader set");
        }
        excluded.extend(venues);

        let timelines = build_timelines(&relevant, token_mint, &excluded);
        let self_trades = self.self_trades.detect(&timelines);

        let graph = TransferGraph::from_swaps(&relevant, token_mint, &excluded);
        let circular_patterns = self.circular.detect(&graph);

        let timestamps: Vec<i64> = relevant.iter().map(|e| e.timestamp_ms).collect();
        let interval_anomaly = self.interval.analyze(&timestamps);

        let volume_anomaly = stats.map(|s| self.volume.analyze(s));

        let score = self.aggregator.aggregate(&WashScoreInputs {
            self_trades: &self_trades,
            circular_patterns: &circular_patterns,
            interval_anomaly: interval_anomaly.as_ref(),
            volume_anomaly: volume_anomaly.as_ref(),
            unique_traders: timelines.len(),
            price_usd: stats.and_then(|s| s.price_usd),
        });

        let mut warnings = score.warnings;
        if relevant.is_empty() {
            warnings.push(AnalysisWarning::new(
                warning_codes::INSUFFICIENT_DATA,
                "No swap activity found for this token",
                Severity::Low,
            ));
        } else if interval_anomaly.is_none() {
            warnings.push(AnalysisWarning::new(
                warning_codes::INSUFFICIENT_DATA,
                format!(
                    "Only {} swaps available; timing analysis needs {}",
                    relevant.len(),
                    self.config.min_interval_transactions
                ),
                Severity::Low,
            ));
        }

        if stats.is_some_and(|s| s.holder_count.is_none()) {
            warnings.push(AnalysisWarning::new(
                warning_codes::INSUFFICIENT_DATA,
                "Holder count unavailable; volume scored on price impact only",
                Severity::Low,
            ));
        }

        let analysis_time_ms = start.elapsed().as_millis() as u64;
        info!(
            mint = token_mint,
            wash_score = score.score,
            risk = score.risk_level.as_str(),
            self_trades = self_trades.len(),
            circular = circular_patterns.len(),
            swaps = relevant.len(),
            analysis_time_ms,
            "Wash trading analysis complete"
        );

        WashTradingAnalysis {
            token_mint: token_mint.to_string(),
            wash_score: score.score,
            risk_level: score.risk_level,
            self_trades,
            circular_patterns,
            interval_anomaly,
            volume_anomaly,
            unique_traders: timelines.len(),
            transactions_analyzed: relevant.len(),
            reported_volume: score.reported_volume,
            estimated_real_volume: score.estimated_real_volume,
            breakdown: score.breakdown,
            warnings,
            analysis_time_ms,
            analyzed_at: Utc::now(),
            cached: false,
        }
    }
}

impl Default for WashTradingDetector {
    fn default() -> Self {
        Self::new(WashTradingConfig::default())
    }
}
