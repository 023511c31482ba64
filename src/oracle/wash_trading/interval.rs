//! Interval Regularity Analyzer
//!
//! Bots trade on a cadence; people do not. The coefficient of variation of
//! inter-arrival times separates the two: low variance yields a high
//! regularity score, organic trading (cv around 1-2) a low one.

use serde::{Deserialize, Serialize};

/// Timing statistics for a token's swap stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalAnomaly {
    pub average_interval_ms: f64,
    pub std_deviation: f64,
    pub regularity_score: u8,
    pub transaction_count: usize,
}

#[derive(Debug, Clone)]
pub struct IntervalRegularityAnalyzer {
    min_transactions: usize,
}

impl IntervalRegularityAnalyzer {
    pub fn new(min_transactions: usize) -> Self {
        Self {
            min_transactions: min_transactions.max(2),
        }
    }

    /// Returns `None` when fewer than the minimum number of timestamps exist
    pub fn analyze(&self, timestamps: &[i64]) -> Option<IntervalAnomaly> {
        if timestamps.len() < self.min_transactions {
            return None;
        }

        let mut sorted = timestamps.to_vec();
        sorted.sort_unstable();

        let intervals: Vec<f64> = sorted
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f64)
            .collect();

        let n = intervals.len() as f64;
        let mean = intervals.iter().sum::<f64>() / n;
        let variance = intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / n;
        let std_deviation = variance.sqrt();

        // All events in the same millisecond: no spread to measure
        let cv = if mean > 0.0 { std_deviation / mean } else { 0.0 };
        let regularity_score = ((1.0 - cv) * 100.0 + 50.0).round().clamp(0.0, 100.0) as u8;

        Some(IntervalAnomaly {
            average_interval_ms: mean,
            std_deviation,
            regularity_score,
            transaction_count: sorted.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_minimum_transactions() {
        let analyzer = IntervalRegularityAnalyzer::new(10);
        let timestamps: Vec<i64> = (0..9).map(|i| i * 1_000).collect();
        assert!(analyzer.analyze(&timestamps).is_none());
    }

    #[test]
    fn test_perfect_cadence_scores_hundred() {
        let analyzer = IntervalRegularityAnalyzer::new(10);
        let timestamps: Vec<i64> = (0..12).map(|i| i * 2_000).collect();
        let anomaly = analyzer.analyze(&timestamps).unwrap();

        assert_eq!(anomaly.regularity_score, 100);
        assert_eq!(anomaly.average_interval_ms, 2_000.0);
        assert_eq!(anomaly.std_deviation, 0.0);
        assert_eq!(anomaly.transaction_count, 12);
    }

    #[test]
    fn test_bursty_trading_scores_low() {
        let analyzer = IntervalRegularityAnalyzer::new(10);
        // Long quiet stretches broken by bursts: cv well above 1
        let timestamps = vec![0, 10, 20, 30, 100_000, 100_010, 100_020, 400_000, 400_005, 900_000];
        let anomaly = analyzer.analyze(&timestamps).unwrap();
        assert!(anomaly.regularity_score <= 30, "score {}", anomaly.regularity_score);
    }

    #[test]
    fn test_identical_timestamps_do_not_divide_by_zero() {
        let analyzer = IntervalRegularityAnalyzer::new(10);
        let anomaly = analyzer.analyze(&[5_000; 10]).unwrap();
        assert_eq!(anomaly.regularity_score, 100);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let analyzer = IntervalRegularityAnalyzer::new(10);
        let mut timestamps: Vec<i64> = (0..10).map(|i| i * 1_000).collect();
        timestamps.reverse();
        assert_eq!(analyzer.analyze(&timestamps).unwrap().regularity_score, 100);
    }
}
