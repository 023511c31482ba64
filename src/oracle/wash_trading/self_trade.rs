//! Self-Trade Detector
//!
//! Finds same-wallet buy→sell round trips inside a short window. Every
//! qualifying (buy, sell) pair is reported, so a wallet with three buys and
//! three sells can produce up to nine entries: the count is a volume-weighted
//! signal, not a count of unique incidents.

use crate::oracle::timeline::WalletTimeline;
use crate::oracle::types::{TxSignature, WalletAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A buy followed by a sell from the same wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfTrade {
    pub wallet: WalletAddress,
    pub buy_tx: TxSignature,
    pub sell_tx: TxSignature,
    pub buy_amount: f64,
    pub sell_amount: f64,
    pub time_between_ms: i64,
    /// 100 for an instant round trip, 50 at the window bound
    pub suspicion_score: u8,
}

impl SelfTrade {
    /// Token volume the round trip added to the tape
    pub fn volume(&self) -> f64 {
        self.buy_amount + self.sell_amount
    }
}

/// Pairs buys and sells of the same wallet
#[derive(Debug, Clone)]
pub struct SelfTradeDetector {
    window_ms: i64,
}

impl SelfTradeDetector {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(1),
        }
    }

    /// Detect round trips across all timelines, ordered by wallet then buy time
    pub fn detect(&self, timelines: &HashMap<WalletAddress, WalletTimeline>) -> Vec<SelfTrade> {
        let mut trades: Vec<SelfTrade> = timelines
            .values()
            .flat_map(|timeline| self.detect_wallet(timeline))
            .collect();

        trades.sort_by(|a, b| {
            a.wallet
                .cmp(&b.wallet)
                .then_with(|| a.buy_tx.cmp(&b.buy_tx))
                .then_with(|| a.time_between_ms.cmp(&b.time_between_ms))
        });
        trades
    }

    fn detect_wallet(&self, timeline: &WalletTimeline) -> Vec<SelfTrade> {
        let mut trades = Vec::new();

        for buy in &timeline.buys {
            for sell in &timeline.sells {
                let time_between_ms = sell.timestamp_ms - buy.timestamp_ms;
                if time_between_ms <= 0 || time_between_ms >= self.window_ms {
                    continue;
                }

                trades.push(SelfTrade {
                    wallet: timeline.wallet.clone(),
                    buy_tx: buy.signature.clone(),
                    sell_tx: sell.signature.clone(),
                    buy_amount: buy.amount,
                    sell_amount: sell.amount,
                    time_between_ms,
                    suspicion_score: self.suspicion_score(time_between_ms),
                });
            }
        }

        trades
    }

    fn suspicion_score(&self, time_between_ms: i64) -> u8 {
        let score = 100.0 - (time_between_ms as f64 / self.window_ms as f64) * 50.0;
        score.round().clamp(0.0, 100.0) as u8
    }
}
