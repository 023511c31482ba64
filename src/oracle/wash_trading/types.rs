//! Types for wash-trading analysis

use super::circular::CircularPattern;
use super::interval::IntervalAnomaly;
use super::self_trade::SelfTrade;
use super::volume::VolumeAnomalyData;
use crate::oracle::types::AnalysisWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wash-trading risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WashRiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Extreme,
}

impl WashRiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Extreme,
            60..=79 => Self::High,
            40..=59 => Self::Medium,
            20..=39 => Self::Low,
            _ => Self::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extreme => "EXTREME",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Minimal => "MINIMAL",
        }
    }
}

/// Points each detector contributed to the wash score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WashScoreBreakdown {
    pub self_trade_points: f64,
    pub circular_points: f64,
    pub regularity_points: f64,
    pub volume_points: f64,
    pub diversity_points: f64,
}

impl WashScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.self_trade_points
            + self.circular_points
            + self.regularity_points
            + self.volume_points
            + self.diversity_points
    }
}

/// Wash-trading verdict for one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WashTradingAnalysis {
    pub token_mint: String,
    /// 0-100, higher means more of the volume looks fake
    pub wash_score: u8,
    pub risk_level: WashRiskLevel,
    pub self_trades: Vec<SelfTrade>,
    pub circular_patterns: Vec<CircularPattern>,
    pub interval_anomaly: Option<IntervalAnomaly>,
    /// `None` when market stats were unavailable
    pub volume_anomaly: Option<VolumeAnomalyData>,
    pub unique_traders: usize,
    pub transactions_analyzed: usize,
    pub reported_volume: f64,
    pub estimated_real_volume: f64,
    pub breakdown: WashScoreBreakdown,
    pub warnings: Vec<AnalysisWarning>,
    pub analysis_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
    /// Served from cache rather than computed for this call
    pub cached: bool,
}

impl WashTradingAnalysis {
    /// Zero-risk result for a token with nothing to analyse
    pub fn empty(token_mint: &str) -> Self {
        Self {
            token_mint: token_mint.to_string(),
            wash_score: 0,
            risk_level: WashRiskLevel::Minimal,
            self_trades: Vec::new(),
            circular_patterns: Vec::new(),
            interval_anomaly: None,
            volume_anomaly: None,
            unique_traders: 0,
            transactions_analyzed: 0,
            reported_volume: 0.0,
            estimated_real_volume: 0.0,
            breakdown: WashScoreBreakdown::default(),
            warnings: Vec::new(),
            analysis_time_ms: 0,
            analyzed_at: Utc::now(),
            cached: false,
        }
    }

    /// One-line verdict for alerting
    pub fn summary(&self) -> String {
        let real_share = if self.reported_volume > 0.0 {
            self.estimated_real_volume / self.reported_volume * 100.0
        } else {
            100.0
        };

        format!(
            "{} wash risk (score {}/100): {} self-trades, {} circular patterns, ~{:.0}% of volume looks real",
            self.risk_level.as_str(),
            self.wash_score,
            self.self_trades.len(),
            self.circular_patterns.len(),
            real_share
        )
    }
}
