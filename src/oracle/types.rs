//! Core data types shared by the wash-trading and sniper analyses
//!
//! Swap events arrive from an upstream feed and are treated as immutable
//! snapshots. Everything derived from them (timelines, graphs, verdicts) is
//! rebuilt per analysis call.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Base58 wallet address
pub type WalletAddress = String;

/// Base58 transaction signature
pub type TxSignature = String;

/// Warning codes attached to analyses
pub mod warning_codes {
    pub const SELF_TRADING: &str = "SELF_TRADING";
    pub const CIRCULAR_TRADING: &str = "CIRCULAR_TRADING";
    pub const BOT_TIMING: &str = "BOT_TIMING";
    pub const VOLUME_ANOMALY: &str = "VOLUME_ANOMALY";
    pub const LOW_TRADER_DIVERSITY: &str = "LOW_TRADER_DIVERSITY";
    pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
    pub const NO_SWAP_DATA: &str = "NO_SWAP_DATA";
    pub const CREATION_BLOCK_UNKNOWN: &str = "CREATION_BLOCK_UNKNOWN";
    pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";
    pub const ENRICHMENT_DEGRADED: &str = "ENRICHMENT_DEGRADED";
}

/// A single token movement inside a swap transaction.
///
/// Fields are optional because upstream parsers regularly emit partial
/// records; incomplete transfers are skipped by every detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub mint: Option<String>,
    pub from: Option<WalletAddress>,
    pub to: Option<WalletAddress>,
    pub amount: f64,
}

impl TokenTransfer {
    pub fn new(mint: &str, from: &str, to: &str, amount: f64) -> Self {
        Self {
            mint: Some(mint.to_string()),
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            amount,
        }
    }

    /// Returns `(from, to, amount)` when the transfer moves `mint` between
    /// two distinct, present wallets with a positive finite amount.
    pub fn resolve(&self, mint: &str) -> Option<(&str, &str, f64)> {
        let transfer_mint = self.mint.as_deref()?;
        let from = self.from.as_deref()?;
        let to = self.to.as_deref()?;

        if transfer_mint != mint || from.is_empty() || to.is_empty() || from == to {
            return None;
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return None;
        }

        Some((from, to, self.amount))
    }
}

/// Ordered swap transaction supplied by the swap feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEvent {
    pub signature: TxSignature,
    pub timestamp_ms: i64,
    pub slot: u64,
    pub transfers: Vec<TokenTransfer>,
    /// Every account referenced by the transaction (used for tip-account checks)
    #[serde(default)]
    pub account_keys: Vec<String>,
}

impl SwapEvent {
    /// Whether the transaction references any of `accounts`, either as an
    /// account key or as a transfer counterparty.
    pub fn touches_any(&self, accounts: &HashSet<String>) -> bool {
        if accounts.is_empty() {
            return false;
        }

        self.account_keys.iter().any(|key| accounts.contains(key))
            || self.transfers.iter().any(|t| {
                t.to.as_ref().is_some_and(|to| accounts.contains(to))
                    || t.from.as_ref().is_some_and(|from| accounts.contains(from))
            })
    }

    /// Whether at least one well-formed transfer of `mint` is present
    pub fn involves_mint(&self, mint: &str) -> bool {
        self.transfers.iter().any(|t| t.resolve(mint).is_some())
    }
}

/// Token market statistics from the market-stats provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMarketStats {
    /// 24h traded volume in USD
    pub volume_24h: f64,
    /// 24h price change in percent
    pub price_change_24h: f64,
    /// `None` when no holder source answered
    pub holder_count: Option<u64>,
    pub liquidity_usd: f64,
    /// Spot price in USD, used to value token-denominated volume
    pub price_usd: Option<f64>,
}

/// Token creation details from the launch-info provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLaunchInfo {
    pub creation_slot: u64,
    pub creation_time_ms: Option<i64>,
    /// Total supply in UI units (decimals applied)
    pub total_supply: f64,
}

/// A position the wallet opened and closed in some earlier token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedPosition {
    pub entry_ms: i64,
    pub exit_ms: i64,
    /// Realized PnL in percent, when a price oracle could value the trade
    pub pnl_percent: Option<f64>,
}

impl ClosedPosition {
    pub fn hold_time_ms(&self) -> i64 {
        (self.exit_ms - self.entry_ms).max(0)
    }
}

/// Prior sniping activity of a wallet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnipeHistory {
    /// Number of launches the wallet bought into within the first blocks
    pub total_sniped: u32,
    pub positions: Vec<ClosedPosition>,
}

/// Warning severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Machine-readable warning rendered verbatim by downstream layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl AnalysisWarning {
    pub fn new(code: &str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_skips_malformed_transfers() {
        let good = TokenTransfer::new("mint", "a", "b", 10.0);
        assert_eq!(good.resolve("mint"), Some(("a", "b", 10.0)));
        assert!(good.resolve("other_mint").is_none());

        let missing_to = TokenTransfer {
            to: None,
            ..good.clone()
        };
        assert!(missing_to.resolve("mint").is_none());

        let self_transfer = TokenTransfer::new("mint", "a", "a", 10.0);
        assert!(self_transfer.resolve("mint").is_none());

        let nan = TokenTransfer::new("mint", "a", "b", f64::NAN);
        assert!(nan.resolve("mint").is_none());

        let zero = TokenTransfer::new("mint", "a", "b", 0.0);
        assert!(zero.resolve("mint").is_none());
    }

    #[test]
    fn test_touches_any_checks_keys_and_transfers() {
        let event = SwapEvent {
            signature: "sig".to_string(),
            timestamp_ms: 0,
            slot: 1,
            transfers: vec![TokenTransfer::new("mint", "a", "tip", 1.0)],
            account_keys: vec!["a".to_string(), "pool".to_string()],
        };

        let tips: HashSet<String> = ["tip".to_string()].into_iter().collect();
        assert!(event.touches_any(&tips));

        let pool: HashSet<String> = ["pool".to_string()].into_iter().collect();
        assert!(event.touches_any(&pool));

        assert!(!event.touches_any(&HashSet::new()));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_swap_event_deserializes_without_account_keys() {
        let json = r#"{"signature":"s","timestampMs":5,"slot":9,"transfers":[{"mint":"m","from":"a","to":"b","amount":2.5}]}"#;
        let event: SwapEvent = serde_json::from_str(json).unwrap();
        assert!(event.account_keys.is_empty());
        assert!(event.involves_mint("m"));
    }
}
