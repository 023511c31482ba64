//! Volume Anomaly Analyzer
//!
//! Real volume moves price and is spread over many holders. Large volume on
//! a flat price, or concentrated in a handful of holders, points at fake
//! turnover.
//!
//! Without a holder count only the price-impact ratio is scored.

use crate::oracle::types::TokenMarketStats;
use serde::{Deserialize, Serialize};

/// Substitute for a zero price change so the ratio stays finite
const FLAT_PRICE_CHANGE: f64 = 0.01;

/// Derived volume statistics and their anomaly score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnomalyData {
    pub reported_volume: f64,
    pub price_change: f64,
    pub volume_to_price_ratio: f64,
    pub holder_count: Option<u64>,
    pub volume_per_holder: Option<f64>,
    pub anomaly_score: u8,
}

#[derive(Debug, Clone, Default)]
pub struct VolumeAnomalyAnalyzer;

impl VolumeAnomalyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, stats: &TokenMarketStats) -> VolumeAnomalyData {
        let volume = sanitize(stats.volume_24h);
        let price_change = sanitize_signed(stats.price_change_24h);

        let abs_change = price_change.abs();
        let divisor = if abs_change > 0.0 { abs_change } else { FLAT_PRICE_CHANGE };
        let volume_to_price_ratio = volume / (divisor * 1000.0);
        let volume_per_holder = stats.holder_count.map(|holders| volume / holders.max(1) as f64);

        let mut score = 0u32;

        score += if volume_to_price_ratio > 10_000.0 {
            40
        } else if volume_to_price_ratio > 5_000.0 {
            25
        } else if volume_to_price_ratio > 1_000.0 {
            10
        } else {
            0
        };

        if let (Some(holders), Some(per_holder)) = (stats.holder_count, volume_per_holder) {
            score += if per_holder > 50_000.0 {
                35
            } else if per_holder > 10_000.0 {
                20
            } else if per_holder > 5_000.0 {
                10
            } else {
                0
            };

            if holders < 100 && volume > 100_000.0 {
                score += 25;
            } else if holders < 500 && volume > 500_000.0 {
                score += 15;
            }
        }

        VolumeAnomalyData {
            reported_volume: volume,
            price_change,
            volume_to_price_ratio,
            holder_count: stats.holder_count,
            volume_per_holder,
            anomaly_score: score.min(100) as u8,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn sanitize_signed(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(volume: f64, price_change: f64, holders: u64) -> TokenMarketStats {
        TokenMarketStats {
            volume_24h: volume,
            price_change_24h: price_change,
            holder_count: Some(holders),
            liquidity_usd: 50_000.0,
            price_usd: Some(0.001),
        }
    }

    #[test]
    fn test_healthy_token_has_no_anomaly() {
        let data = VolumeAnomalyAnalyzer::new().analyze(&stats(200_000.0, 35.0, 2_000));
        assert_eq!(data.volume_per_holder, Some(100.0));
        assert!(data.volume_to_price_ratio < 10.0);
        assert_eq!(data.anomaly_score, 0);
    }

    #[test]
    fn test_flat_price_high_volume_few_holders() {
        let data = VolumeAnomalyAnalyzer::new().analyze(&stats(2_000_000.0, 0.0, 20));
        // ratio = 2e6 / (0.01 * 1000) = 200_000
        assert_eq!(data.volume_to_price_ratio, 200_000.0);
        assert_eq!(data.anomaly_score, 100);
    }

    #[test]
    fn test_mid_tier_contributions() {
        // ratio = 600_000 / (0.1 * 1000) = 6000 -> +25
        // per holder = 600_000 / 400 = 1500 -> 0
        // < 500 holders and > 500k volume -> +15
        let data = VolumeAnomalyAnalyzer::new().analyze(&stats(600_000.0, -0.1, 400));
        assert_eq!(data.anomaly_score, 40);
    }

    #[test]
    fn test_zero_holders_treated_as_one() {
        let data = VolumeAnomalyAnalyzer::new().analyze(&stats(1_000.0, 5.0, 0));
        assert_eq!(data.volume_per_holder, Some(1_000.0));
    }

    #[test]
    fn test_unknown_holders_score_price_impact_only() {
        let unknown = TokenMarketStats {
            holder_count: None,
            ..stats(2_000_000.0, 0.0, 0)
        };
        let data = VolumeAnomalyAnalyzer::new().analyze(&unknown);
        assert_eq!(data.holder_count, None);
        assert_eq!(data.volume_per_holder, None);
        // ratio 200_000 -> +40, holder terms skipped
        assert_eq!(data.anomaly_score, 40);
    }

    #[test]
    fn test_non_finite_inputs_are_zeroed() {
        let data = VolumeAnomalyAnalyzer::new().analyze(&stats(f64::NAN, f64::INFINITY, 10));
        assert_eq!(data.reported_volume, 0.0);
        assert_eq!(data.anomaly_score, 0);
    }
}
