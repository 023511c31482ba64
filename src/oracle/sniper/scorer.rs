//! Sniper Score Aggregator
//!
//! Scores each launch-window wallet, keeps the ones that look like snipers,
//! and rolls them up into a token-level score, risk tier, dump probability and
//! human-readable red flags. Also builds the standalone wallet reputation
//! profile.

use super::enricher::WalletEnrichment;
use super::types::{SniperRisk, SniperWallet, WalletLabel, WalletSniperProfile};
use chrono::Utc;

/// Token-level roll-up of retained snipers
#[derive(Debug, Clone, PartialEq)]
pub struct SniperVerdict {
    pub snipers: Vec<SniperWallet>,
    pub block0_buyers: usize,
    pub known_mev_bots: usize,
    pub jito_bundled: usize,
    pub sniper_score: u8,
    pub sniper_risk: SniperRisk,
    pub dump_probability: u8,
    pub sniper_supply_percent: f64,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SniperScoreAggregator {
    /// Wallets at or under this many blocks are always retained
    block_threshold: u64,
    /// Later wallets are retained from this score up
    score_threshold: u8,
    /// `totalSniped` above this marks a serial sniper
    serial_sniper_min: u32,
}

impl SniperScoreAggregator {
    pub fn new(block_threshold: u64, score_threshold: u8, serial_sniper_min: u32) -> Self {
        Self {
            block_threshold,
            score_threshold,
            serial_sniper_min,
        }
    }

    fn is_proven_winner(&self, win_rate: Option<f64>, total_sniped: u32) -> bool {
        total_sniped > self.serial_sniper_min && win_rate.is_some_and(|rate| rate > 70.0)
    }

    pub fn score_wallet(&self, wallet: &SniperWallet) -> u8 {
        let mut score: u32 = match wallet.blocks_from_launch {
            0 => 40,
            1..=2 => 30,
            3..=5 => 20,
            _ => 0,
        };

        if wallet.is_jito_bundled {
            score += 25;
        }
        if wallet.is_known_mev_bot {
            score += 30;
        }
        if wallet.is_precise_amount {
            score += 15;
        }
        if wallet.is_new_wallet && wallet.blocks_from_launch <= 5 {
            score += 15;
        }
        if wallet.is_fast_exiter {
            score += 10;
        }
        if self.is_proven_winner(wallet.win_rate, wallet.total_sniped) {
            score += 10;
        }

        score.min(100) as u8
    }

    /// Score every candidate, keep the snipers and aggregate them
    pub fn aggregate(&self, candidates: Vec<SniperWallet>) -> SniperVerdict {
        let mut snipers: Vec<SniperWallet> = candidates
            .into_iter()
            .map(|mut wallet| {
                wallet.sniper_score = self.score_wallet(&wallet);
                wallet
            })
            .filter(|w| w.blocks_from_launch <= self.block_threshold || w.sniper_score >= self.score_threshold)
            .collect();

        snipers.sort_by(|a, b| {
            b.sniper_score
                .cmp(&a.sniper_score)
                .then_with(|| a.blocks_from_launch.cmp(&b.blocks_from_launch))
                .then_with(|| a.address.cmp(&b.address))
        });

        let count = snipers.len();
        let block0_buyers = snipers.iter().filter(|w| w.blocks_from_launch == 0).count();
        let known_mev_bots = snipers.iter().filter(|w| w.is_known_mev_bot).count();
        let jito_bundled = snipers.iter().filter(|w| w.is_jito_bundled).count();
        let sniper_supply_percent: f64 = snipers
            .iter()
            .map(|w| w.percentage_of_supply)
            .filter(|p| p.is_finite() && *p > 0.0)
            .sum();

        let raw_score = (count as f64 * 5.0).min(30.0)
            + (block0_buyers as f64 * 8.0).min(25.0)
            + (known_mev_bots as f64 * 10.0).min(20.0)
            + (sniper_supply_percent / 2.0).min(25.0);
        let sniper_score = raw_score.round().clamp(0.0, 100.0) as u8;

        let dump_probability = if count == 0 {
            0
        } else {
            let avg_score = snipers.iter().map(|w| w.sniper_score as f64).sum::<f64>() / count as f64;
            let p = (sniper_supply_percent / 100.0) * 0.4
                + (avg_score / 100.0) * 0.3
                + (known_mev_bots as f64 / count as f64) * 0.3;
            (p.clamp(0.0, 1.0) * 100.0).round() as u8
        };

        let red_flags = red_flags(&snipers, block0_buyers, known_mev_bots, jito_bundled, sniper_supply_percent);

        SniperVerdict {
            snipers,
            block0_buyers,
            known_mev_bots,
            jito_bundled,
            sniper_score,
            sniper_risk: SniperRisk::from_score(sniper_score),
            dump_probability,
            sniper_supply_percent,
            red_flags,
        }
    }

    /// Reputation profile of a single wallet
    pub fn profile(&self, address: &str, enrichment: &WalletEnrichment) -> WalletSniperProfile {
        let mut reputation: u32 = 0;
        if enrichment.is_known_mev_bot {
            reputation += 30;
        }
        if enrichment.is_new_wallet {
            reputation += 15;
        }
        if enrichment.is_fast_exiter {
            reputation += 10;
        }
        if self.is_proven_winner(enrichment.win_rate, enrichment.total_sniped) {
            reputation += 10;
        }
        reputation += (enrichment.total_sniped.saturating_mul(3)).min(35);

        let label = if enrichment.is_known_mev_bot {
            WalletLabel::KnownMevBot
        } else if enrichment.total_sniped > self.serial_sniper_min {
            WalletLabel::SerialSniper
        } else if enrichment.is_new_wallet {
            WalletLabel::FreshWallet
        } else if enrichment.is_fast_exiter {
            WalletLabel::FastFlipper
        } else {
            WalletLabel::Ordinary
        };

        WalletSniperProfile {
            address: address.to_string(),
            wallet_age_days: enrichment.wallet_age_days,
            total_sniped: enrichment.total_sniped,
            win_rate: enrichment.win_rate,
            avg_hold_time_minutes: enrichment.avg_hold_time_minutes,
            fast_exit_ratio: enrichment.fast_exit_ratio,
            is_fast_exiter: enrichment.is_fast_exiter,
            is_new_wallet: enrichment.is_new_wallet,
            is_known_mev_bot: enrichment.is_known_mev_bot,
            reputation_score: reputation.min(100) as u8,
            label,
            warnings: Vec::new(),
            analyzed_at: Utc::now(),
            cached: false,
        }
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {}", one)
    } else {
        format!("{} {}", n, many)
    }
}

fn red_flags(
    snipers: &[SniperWallet],
    block0_buyers: usize,
    known_mev_bots: usize,
    jito_bundled: usize,
    supply_percent: f64,
) -> Vec<String> {
    let mut flags = Vec::new();

    if block0_buyers > 0 {
        flags.push(format!(
            "{} bought in the same block as launch",
            plural(block0_buyers, "wallet", "wallets")
        ));
    }
    if known_mev_bots > 0 {
        flags.push(format!(
            "{} among early buyers",
            plural(known_mev_bots, "known MEV bot", "known MEV bots")
        ));
    }
    if jito_bundled > 0 {
        flags.push(format!(
            "{} bundled through Jito",
            plural(jito_bundled, "sniper buy", "sniper buys")
        ));
    }
    if supply_percent >= 20.0 {
        flags.push(format!("Snipers hold {:.1}% of supply", supply_percent));
    }

    let fresh = snipers.iter().filter(|w| w.is_new_wallet).count();
    if fresh >= 3 {
        flags.push(format!("{} snipers are freshly created wallets", fresh));
    }
    let precise = snipers.iter().filter(|w| w.is_precise_amount).count();
    if precise >= 3 {
        flags.push(format!("{} snipers bought scripted round amounts", precise));
    }

    flags
}
