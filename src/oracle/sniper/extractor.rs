//! First-N-Block Buyer Extractor
//!
//! Isolates wallets whose first buy landed within a few blocks of token
//! creation and tags the two script fingerprints visible in the buy itself:
//! a round, hand-typed amount and a Jito tip in the same transaction.

use super::types::SniperWallet;
use crate::oracle::timeline::{build_timelines, VenueDetection};
use crate::oracle::types::{SwapEvent, TokenLaunchInfo};
use std::collections::HashSet;
use tracing::debug;

/// Minimum integer digits for a round amount to count as precise
const PRECISE_MIN_DIGITS: usize = 5;
/// Maximum non-zero digits in a precise amount
const PRECISE_MAX_NONZERO: usize = 2;

#[derive(Debug, Clone)]
pub struct FirstBlockBuyerExtractor {
    max_blocks_from_launch: u64,
    jito_tip_accounts: HashSet<String>,
    excluded_wallets: HashSet<String>,
    venue_detection: VenueDetection,
}

impl FirstBlockBuyerExtractor {
    pub fn new(
        max_blocks_from_launch: u64,
        jito_tip_accounts: HashSet<String>,
        excluded_wallets: HashSet<String>,
        venue_detection: VenueDetection,
    ) -> Self {
        Self {
            max_blocks_from_launch,
            jito_tip_accounts,
            excluded_wallets,
            venue_detection,
        }
    }

    /// Launch-window buyers, earliest block first then largest buy first
    pub fn extract(&self, mint: &str, swaps: &[SwapEvent], launch: &TokenLaunchInfo) -> Vec<SniperWallet> {
        let mut excluded = self.excluded_wallets.clone();
        excluded.extend(self.venue_detection.detect(swaps, mint));
        excluded.extend(self.jito_tip_accounts.iter().cloned());

        let timelines = build_timelines(swaps, mint, &excluded);

        let mut candidates: Vec<SniperWallet> = timelines
            .values()
            .filter_map(|timeline| {
                let buy = timeline.first_buy()?;
                if buy.slot < launch.creation_slot {
                    debug!(wallet = %timeline.wallet, slot = buy.slot, "Buy precedes creation slot, skipping");
                    return None;
                }
                let blocks_from_launch = buy.slot - launch.creation_slot;
                if blocks_from_launch > self.max_blocks_from_launch {
                    return None;
                }

                let mut wallet = SniperWallet::candidate(
                    &timeline.wallet,
                    buy.slot,
                    blocks_from_launch,
                    buy.amount,
                    &buy.signature,
                    buy.timestamp_ms,
                );
                wallet.is_precise_amount = is_precise_amount(buy.amount);
                wallet.is_jito_bundled = swaps
                    .get(buy.event_index)
                    .is_some_and(|event| event.touches_any(&self.jito_tip_accounts));
                if launch.total_supply > 0.0 {
                    wallet.percentage_of_supply = buy.amount / launch.total_supply * 100.0;
                }
                Some(wallet)
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.blocks_from_launch
                .cmp(&b.blocks_from_launch)
                .then_with(|| b.buy_amount.total_cmp(&a.buy_amount))
                .then_with(|| a.address.cmp(&b.address))
        });

        debug!(mint, candidates = candidates.len(), "Extracted launch-window buyers");
        candidates
    }
}

/// Round quantities typed into a bot config: a whole number of at least
/// five digits with no more than two non-zero digits (1_000_000, 2_500_000,
/// any power of ten from 10^4 up).
pub fn is_precise_amount(amount: f64) -> bool {
    if !amount.is_finite() || amount < 10f64.powi(PRECISE_MIN_DIGITS as i32 - 1) || amount.fract() != 0.0 {
        return false;
    }

    let digits = format!("{:.0}", amount);
    let nonzero = digits.chars().filter(|c| *c != '0').count();
    digits.len() >= PRECISE_MIN_DIGITS && nonzero <= PRECISE_MAX_NONZERO
}
