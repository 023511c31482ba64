//! Wash Score Aggregator
//!
//! Combines the four detectors into one 0-100 score, a risk tier and an
//! estimate of how much of the reported volume is real.

use super::circular::CircularPattern;
use super::interval::IntervalAnomaly;
use super::self_trade::SelfTrade;
use super::types::{WashRiskLevel, WashScoreBreakdown};
use super::volume::VolumeAnomalyData;
use crate::oracle::types::{warning_codes, AnalysisWarning, Severity};

const SELF_TRADE_POINTS_EACH: f64 = 3.0;
const SELF_TRADE_POINTS_CAP: f64 = 30.0;
const CIRCULAR_POINTS_EACH: f64 = 5.0;
const CIRCULAR_POINTS_CAP: f64 = 30.0;
const REGULARITY_ALERT: u8 = 60;
const REGULARITY_POINTS_CAP: f64 = 20.0;
const VOLUME_ALERT: u8 = 30;
const VOLUME_POINTS_CAP: f64 = 20.0;
/// Fraction of circular volume assumed to be fake
const CIRCULAR_VOLUME_WEIGHT: f64 = 0.8;

/// Detector outputs for one token
#[derive(Debug, Clone, Copy)]
pub struct WashScoreInputs<'a> {
    pub self_trades: &'a [SelfTrade],
    pub circular_patterns: &'a [CircularPattern],
    pub interval_anomaly: Option<&'a IntervalAnomaly>,
    pub volume_anomaly: Option<&'a VolumeAnomalyData>,
    pub unique_traders: usize,
    /// Used to value token-denominated self-trade and cycle volume in USD
    pub price_usd: Option<f64>,
}

/// Aggregated verdict
#[derive(Debug, Clone, PartialEq)]
pub struct WashScore {
    pub score: u8,
    pub risk_level: WashRiskLevel,
    pub breakdown: WashScoreBreakdown,
    pub reported_volume: f64,
    pub estimated_real_volume: f64,
    pub warnings: Vec<AnalysisWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct WashScoreAggregator;

impl WashScoreAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, inputs: &WashScoreInputs<'_>) -> WashScore {
        let mut breakdown = WashScoreBreakdown::default();
        let mut warnings = Vec::new();

        let self_trade_count = inputs.self_trades.len();
        if self_trade_count > 0 {
            breakdown.self_trade_points =
                (self_trade_count as f64 * SELF_TRADE_POINTS_EACH).min(SELF_TRADE_POINTS_CAP);
            warnings.push(AnalysisWarning::new(
                warning_codes::SELF_TRADING,
                format!("{} self-trade round trips within the detection window", self_trade_count),
                count_severity(self_trade_count, 10, 5),
            ));
        }

        let pattern_count = inputs.circular_patterns.len();
        if pattern_count > 0 {
            let avg_confidence = inputs
                .circular_patterns
                .iter()
                .map(|p| p.confidence as f64)
                .sum::<f64>()
                / pattern_count as f64;
            breakdown.circular_points = (pattern_count as f64 * CIRCULAR_POINTS_EACH + avg_confidence / 5.0)
                .min(CIRCULAR_POINTS_CAP);
            warnings.push(AnalysisWarning::new(
                warning_codes::CIRCULAR_TRADING,
                format!(
                    "{} circular transfer patterns (avg confidence {:.0})",
                    pattern_count, avg_confidence
                ),
                count_severity(pattern_count, 5, 2),
            ));
        }

        if let Some(interval) = inputs.interval_anomaly {
            if interval.regularity_score > REGULARITY_ALERT {
                breakdown.regularity_points =
                    ((interval.regularity_score - REGULARITY_ALERT) as f64 / 2.0).min(REGULARITY_POINTS_CAP);
                warnings.push(AnalysisWarning::new(
                    warning_codes::BOT_TIMING,
                    format!(
                        "Trades arrive on a regular cadence (regularity {}, avg interval {:.0} ms)",
                        interval.regularity_score, interval.average_interval_ms
                    ),
                    if interval.regularity_score >= 85 {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                ));
            }
        }

        if let Some(volume) = inputs.volume_anomaly {
            if volume.anomaly_score > VOLUME_ALERT {
                breakdown.volume_points = (volume.anomaly_score as f64 / 3.0).min(VOLUME_POINTS_CAP);
                let message = match volume.volume_per_holder {
                    Some(per_holder) => format!(
                        "Volume out of line with price action and holders (anomaly {}, ${:.0} per holder)",
                        volume.anomaly_score, per_holder
                    ),
                    None => format!("Volume out of line with price action (anomaly {})", volume.anomaly_score),
                };
                warnings.push(AnalysisWarning::new(
                    warning_codes::VOLUME_ANOMALY,
                    message,
                    if volume.anomaly_score >= 70 {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                ));
            }
        }

        let reported_volume = inputs.volume_anomaly.map_or(0.0, |v| v.reported_volume);

        // Diversity only sharpens an existing signal; on its own it says
        // nothing about a quiet token.
        if breakdown.total() > 0.0 && reported_volume > 0.0 {
            let traders_per_10k = inputs.unique_traders as f64 / (reported_volume / 10_000.0);
            let (points, severity) = if traders_per_10k < 0.1 {
                (10.0, Severity::Medium)
            } else if traders_per_10k < 0.5 {
                (5.0, Severity::Low)
            } else {
                (0.0, Severity::Low)
            };
            if points > 0.0 {
                breakdown.diversity_points = points;
                warnings.push(AnalysisWarning::new(
                    warning_codes::LOW_TRADER_DIVERSITY,
                    format!(
                        "Only {} unique traders for ${:.0} of volume ({:.2} per $10k)",
                        inputs.unique_traders, reported_volume, traders_per_10k
                    ),
                    severity,
                ));
            }
        }

        let score = breakdown.total().round().clamp(0.0, 100.0) as u8;
        let estimated_real_volume = self.estimate_real_volume(inputs, reported_volume, score);

        WashScore {
            score,
            risk_level: WashRiskLevel::from_score(score),
            breakdown,
            reported_volume,
            estimated_real_volume,
            warnings,
        }
    }

    fn estimate_real_volume(&self, inputs: &WashScoreInputs<'_>, reported_volume: f64, score: u8) -> f64 {
        let to_usd = |amount: f64| match inputs.price_usd {
            Some(price) if price.is_finite() && price > 0.0 => amount * price,
            _ => amount,
        };

        let self_trade_volume: f64 = inputs.self_trades.iter().map(|t| to_usd(t.volume())).sum();
        let circular_volume: f64 = inputs
            .circular_patterns
            .iter()
            .map(|p| to_usd(p.total_volume))
            .sum();

        let organic = reported_volume - self_trade_volume - CIRCULAR_VOLUME_WEIGHT * circular_volume;
        let discount = (1.0 - score as f64 / 200.0).max(0.1);
        let estimate = organic * discount;

        if estimate.is_finite() {
            estimate.max(0.0)
        } else {
            0.0
        }
    }
}

fn count_severity(count: usize, critical_at: usize, high_at: usize) -> Severity {
    if count >= critical_at {
        Severity::Critical
    } else if count >= high_at {
        Severity::High
    } else {
        Severity::Medium
    }
}
