//! Types for sniper and MEV analysis

use crate::oracle::types::{AnalysisWarning, TxSignature, WalletAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token-level sniper risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SniperRisk {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl SniperRisk {
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => Self::Critical,
            50..=74 => Self::High,
            30..=49 => Self::Medium,
            15..=29 => Self::Low,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::None => "NONE",
        }
    }
}

/// A wallet that bought within the launch window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SniperWallet {
    pub address: WalletAddress,
    pub buy_block: u64,
    pub blocks_from_launch: u64,
    pub buy_amount: f64,
    pub buy_signature: TxSignature,
    pub buy_timestamp_ms: i64,
    pub percentage_of_supply: f64,
    /// Days since the wallet's first transaction, `None` when unknown
    pub wallet_age_days: Option<f64>,
    pub total_sniped: u32,
    /// Percent of past snipes closed in profit, `None` when no outcome data exists
    pub win_rate: Option<f64>,
    pub avg_hold_time_minutes: Option<f64>,
    #[serde(rename = "isKnownMEVBot")]
    pub is_known_mev_bot: bool,
    pub is_jito_bundled: bool,
    pub is_precise_amount: bool,
    pub is_new_wallet: bool,
    pub is_fast_exiter: bool,
    pub sniper_score: u8,
}

impl SniperWallet {
    /// Candidate straight from the buyer extractor, before enrichment
    pub fn candidate(
        address: &str,
        buy_block: u64,
        blocks_from_launch: u64,
        buy_amount: f64,
        buy_signature: &str,
        buy_timestamp_ms: i64,
    ) -> Self {
        Self {
            address: address.to_string(),
            buy_block,
            blocks_from_launch,
            buy_amount,
            buy_signature: buy_signature.to_string(),
            buy_timestamp_ms,
            percentage_of_supply: 0.0,
            wallet_age_days: None,
            total_sniped: 0,
            win_rate: None,
            avg_hold_time_minutes: None,
            is_known_mev_bot: false,
            is_jito_bundled: false,
            is_precise_amount: false,
            is_new_wallet: false,
            is_fast_exiter: false,
            sniper_score: 0,
        }
    }
}

/// Sniper/MEV verdict for one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SniperAnalysis {
    pub token_mint: String,
    pub creation_slot: Option<u64>,
    pub total_snipers: usize,
    pub block0_buyers: usize,
    #[serde(rename = "knownMEVBots")]
    pub known_mev_bots: usize,
    pub jito_bundled: usize,
    pub sniper_score: u8,
    pub sniper_risk: SniperRisk,
    pub dump_probability: u8,
    pub sniper_supply_percent: f64,
    /// Retained snipers, highest score first
    pub snipers: Vec<SniperWallet>,
    pub red_flags: Vec<String>,
    pub warnings: Vec<AnalysisWarning>,
    pub analysis_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
    pub cached: bool,
}

impl SniperAnalysis {
    /// No-risk result used when data is missing
    pub fn empty(token_mint: &str) -> Self {
        Self {
            token_mint: token_mint.to_string(),
            creation_slot: None,
            total_snipers: 0,
            block0_buyers: 0,
            known_mev_bots: 0,
            jito_bundled: 0,
            sniper_score: 0,
            sniper_risk: SniperRisk::None,
            dump_probability: 0,
            sniper_supply_percent: 0.0,
            snipers: Vec::new(),
            red_flags: Vec::new(),
            warnings: Vec::new(),
            analysis_time_ms: 0,
            analyzed_at: Utc::now(),
            cached: false,
        }
    }

    /// One-line verdict for alerting
    pub fn summary(&self) -> String {
        format!(
            "{} sniper risk (score {}/100): {} snipers, {} in block 0, {} MEV bots, {:.1}% of supply, {}% dump probability",
            self.sniper_risk.as_str(),
            self.sniper_score,
            self.total_snipers,
            self.block0_buyers,
            self.known_mev_bots,
            self.sniper_supply_percent,
            self.dump_probability
        )
    }
}

/// Classification of a single wallet's launch behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletLabel {
    #[serde(rename = "KNOWN_MEV_BOT")]
    KnownMevBot,
    SerialSniper,
    FreshWallet,
    FastFlipper,
    Ordinary,
}

/// Reputation of one wallet as a launch sniper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSniperProfile {
    pub address: WalletAddress,
    pub wallet_age_days: Option<f64>,
    pub total_sniped: u32,
    pub win_rate: Option<f64>,
    pub avg_hold_time_minutes: Option<f64>,
    pub fast_exit_ratio: f64,
    pub is_fast_exiter: bool,
    pub is_new_wallet: bool,
    #[serde(rename = "isKnownMEVBot")]
    pub is_known_mev_bot: bool,
    pub reputation_score: u8,
    pub label: WalletLabel,
    pub warnings: Vec<AnalysisWarning>,
    pub analyzed_at: DateTime<Utc>,
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniper_risk_thresholds() {
        assert_eq!(SniperRisk::from_score(75), SniperRisk::Critical);
        assert_eq!(SniperRisk::from_score(74), SniperRisk::High);
        assert_eq!(SniperRisk::from_score(50), SniperRisk::High);
        assert_eq!(SniperRisk::from_score(30), SniperRisk::Medium);
        assert_eq!(SniperRisk::from_score(15), SniperRisk::Low);
        assert_eq!(SniperRisk::from_score(14), SniperRisk::None);
    }

    #[test]
    fn test_serialized_field_names() {
        let wallet = SniperWallet::candidate("w", 10, 0, 1.0, "sig", 0);
        let json = serde_json::to_value(&wallet).unwrap();
        assert!(json.get("isKnownMEVBot").is_some());
        assert!(json.get("blocksFromLaunch").is_some());

        let label = serde_json::to_string(&WalletLabel::KnownMevBot).unwrap();
        assert_eq!(label, "\"KNOWN_MEV_BOT\"");
        let label = serde_json::to_string(&WalletLabel::SerialSniper).unwrap();
        assert_eq!(label, "\"SERIAL_SNIPER\"");
    }

    #[test]
    fn test_empty_analysis_summary() {
        let analysis = SniperAnalysis::empty("mint");
        assert_eq!(analysis.sniper_risk, SniperRisk::None);
        assert!(analysis.summary().starts_with("NONE"));
    }
}
