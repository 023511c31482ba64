//! Per-wallet buy/sell timelines derived from swap events
//!
//! A transfer of the analysed mint *to* a wallet counts as a buy for that
//! wallet, a transfer *from* it as a sell. Timelines are rebuilt for every
//! analysis call and never persisted.
//!
//! Liquidity venues (pool vaults, bonding curves) sit on the other side of
//! almost every swap. They are recognised by their share of events and their
//! number of distinct counterparties and left out of the timelines so they
//! do not show up as traders.

use super::types::{SwapEvent, TxSignature, WalletAddress};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Direction of a trade from the wallet's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A single buy or sell of the analysed mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub signature: TxSignature,
    pub timestamp_ms: i64,
    pub slot: u64,
    pub amount: f64,
    pub side: TradeSide,
    /// Index of the originating event in the input slice
    pub event_index: usize,
}

/// Ordered trades of one wallet for one token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletTimeline {
    pub wallet: WalletAddress,
    pub buys: Vec<TimelineEntry>,
    pub sells: Vec<TimelineEntry>,
}

impl WalletTimeline {
    fn new(wallet: &str) -> Self {
        Self {
            wallet: wallet.to_string(),
            ..Default::default()
        }
    }

    pub fn trade_count(&self) -> usize {
        self.buys.len() + self.sells.len()
    }

    /// Earliest buy by slot, then timestamp
    pub fn first_buy(&self) -> Option<&TimelineEntry> {
        self.buys.first()
    }
}

/// Heuristic for recognising liquidity venues among transfer counterparties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueDetection {
    /// Minimum fraction of mint-moving events a venue takes part in
    pub min_event_share: f64,
    /// Minimum distinct counterparties a venue trades with
    pub min_counterparties: usize,
}

impl Default for VenueDetection {
    fn default() -> Self {
        Self {
            min_event_share: 0.6,
            min_counterparties: 5,
        }
    }
}

impl VenueDetection {
    /// Wallets that behave like a liquidity venue for `mint`
    pub fn detect(&self, swaps: &[SwapEvent], mint: &str) -> HashSet<WalletAddress> {
        let mut events_per_wallet: HashMap<&str, usize> = HashMap::new();
        let mut counterparties: HashMap<&str, HashSet<&str>> = HashMap::new();
        let mut relevant_events = 0usize;

        for event in swaps {
            let mut seen_in_event: HashSet<&str> = HashSet::new();
            for transfer in &event.transfers {
                let Some((from, to, _)) = transfer.resolve(mint) else {
                    continue;
                };
                seen_in_event.insert(from);
                seen_in_event.insert(to);
                counterparties.entry(from).or_default().insert(to);
                counterparties.entry(to).or_default().insert(from);
            }
            if seen_in_event.is_empty() {
                continue;
            }
            relevant_events += 1;
            for wallet in seen_in_event {
                *events_per_wallet.entry(wallet).or_default() += 1;
            }
        }

        if relevant_events == 0 {
            return HashSet::new();
        }

        events_per_wallet
            .into_iter()
            .filter(|(wallet, count)| {
                let share = *count as f64 / relevant_events as f64;
                let distinct = counterparties.get(wallet).map_or(0, |c| c.len());
                share >= self.min_event_share && distinct >= self.min_counterparties
            })
            .map(|(wallet, _)| wallet.to_string())
            .collect()
    }
}

/// Build per-wallet timelines for `mint`, skipping malformed transfers and
/// every wallet in `excluded`.
pub fn build_timelines(
    swaps: &[SwapEvent],
    mint: &str,
    excluded: &HashSet<WalletAddress>,
) -> HashMap<WalletAddress, WalletTimeline> {
    let mut timelines: HashMap<WalletAddress, WalletTimeline> = HashMap::new();
    let mut skipped = 0usize;

    for (event_index, event) in swaps.iter().enumerate() {
        for transfer in &event.transfers {
            let Some((from, to, amount)) = transfer.resolve(mint) else {
                skipped += 1;
                continue;
            };

            let entry = |side| TimelineEntry {
                signature: event.signature.clone(),
                timestamp_ms: event.timestamp_ms,
                slot: event.slot,
                amount,
                side,
                event_index,
            };

            if !excluded.contains(to) {
                timelines
                    .entry(to.to_string())
                    .or_insert_with(|| WalletTimeline::new(to))
                    .buys
                    .push(entry(TradeSide::Buy));
            }
            if !excluded.contains(from) {
                timelines
                    .entry(from.to_string())
                    .or_insert_with(|| WalletTimeline::new(from))
                    .sells
                    .push(entry(TradeSide::Sell));
            }
        }
    }

    for timeline in timelines.values_mut() {
        let order = |a: &TimelineEntry, b: &TimelineEntry| {
            (a.slot, a.timestamp_ms, a.event_index).cmp(&(b.slot, b.timestamp_ms, b.event_index))
        };
        timeline.buys.sort_by(order);
        timeline.sells.sort_by(order);
    }

    if skipped > 0 {
        debug!(skipped, mint, "Skipped transfers that do not move the mint");
    }

    timelines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::types::TokenTransfer;

    fn swap(sig: &str, ts: i64, slot: u64, from: &str, to: &str, amount: f64) -> SwapEvent {
        SwapEvent {
            signature: sig.to_string(),
            timestamp_ms: ts,
            slot,
            transfers: vec![TokenTransfer::new("mint", from, to, amount)],
            account_keys: vec![],
        }
    }

    #[test]
    fn test_buys_and_sells_are_split_by_direction() {
        let swaps = vec![
            swap("s1", 1_000, 10, "pool", "alice", 50.0),
            swap("s2", 2_000, 11, "alice", "pool", 40.0),
        ];

        let timelines = build_timelines(&swaps, "mint", &HashSet::new());
        let alice = &timelines["alice"];
        assert_eq!(alice.buys.len(), 1);
        assert_eq!(alice.sells.len(), 1);
        assert_eq!(alice.buys[0].signature, "s1");
        assert_eq!(alice.sells[0].amount, 40.0);
        assert_eq!(alice.trade_count(), 2);
    }

    #[test]
    fn test_excluded_wallets_and_malformed_transfers_are_skipped() {
        let mut bad = swap("s2", 2_000, 11, "pool", "bob", 5.0);
        bad.transfers[0].from = None;
        let swaps = vec![swap("s1", 1_000, 10, "pool", "alice", 50.0), bad];

        let excluded: HashSet<String> = ["pool".to_string()].into_iter().collect();
        let timelines = build_timelines(&swaps, "mint", &excluded);

        assert!(!timelines.contains_key("pool"));
        assert!(!timelines.contains_key("bob"));
        assert_eq!(timelines["alice"].buys.len(), 1);
    }

    #[test]
    fn test_entries_sorted_by_slot() {
        let swaps = vec![
            swap("late", 5_000, 20, "pool", "alice", 1.0),
            swap("early", 1_000, 10, "pool", "alice", 1.0),
        ];
        let timelines = build_timelines(&swaps, "mint", &HashSet::new());
        assert_eq!(timelines["alice"].first_buy().unwrap().signature, "early");
    }

    #[test]
    fn test_venue_detection_flags_pool_only() {
        let swaps: Vec<SwapEvent> = (0..8)
            .map(|i| swap(&format!("s{}", i), i * 1_000, 10 + i as u64, "pool", &format!("buyer{}", i), 10.0))
            .collect();

        let venues = VenueDetection::default().detect(&swaps, "mint");
        assert_eq!(venues.len(), 1);
        assert!(venues.contains("pool"));
    }

    #[test]
    fn test_venue_detection_ignores_two_party_ping_pong() {
        let swaps: Vec<SwapEvent> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    swap(&format!("s{}", i), i * 1_000, 10, "pool", "trader", 10.0)
                } else {
                    swap(&format!("s{}", i), i * 1_000, 10, "trader", "pool", 10.0)
                }
            })
            .collect();

        assert!(VenueDetection::default().detect(&swaps, "mint").is_empty());
    }
}
