//! Wallet Enricher
//!
//! Looks up wallet age, prior sniping record and current holdings for
//! launch-window buyers. Lookups for one wallet run concurrently, wallets are
//! fanned out with a bounded `buffer_unordered`, and only the first
//! `max_enriched_wallets` candidates are enriched at all.
//!
//! A failed lookup never fails the analysis: the affected fields keep their
//! neutral defaults (unknown age, no history, buy-time supply share) and the
//! failure is reported back to the caller.

use super::types::SniperWallet;
use super::SniperConfig;
use crate::oracle::providers::WalletIntelProvider;
use crate::oracle::types::SnipeHistory;
use crate::utils::retry::{fetch_with_policy, FetchPolicy};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

/// Everything learned about one wallet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletEnrichment {
    pub wallet_age_days: Option<f64>,
    pub total_sniped: u32,
    pub win_rate: Option<f64>,
    pub avg_hold_time_minutes: Option<f64>,
    pub fast_exit_ratio: f64,
    pub closed_trades: usize,
    pub is_fast_exiter: bool,
    pub is_new_wallet: bool,
    pub is_known_mev_bot: bool,
    /// Current holding of the analysed mint, when requested and available
    pub balance: Option<f64>,
    /// Names of lookups that failed and fell back to defaults
    pub failed_lookups: Vec<&'static str>,
}

/// Outcome of enriching a candidate list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub skipped: usize,
    pub failed_lookups: usize,
}

pub struct WalletEnricher {
    provider: Arc<dyn WalletIntelProvider>,
    config: SniperConfig,
    fetch_policy: FetchPolicy,
    known_mev_bots: HashSet<String>,
}

impl WalletEnricher {
    pub fn new(provider: Arc<dyn WalletIntelProvider>, config: SniperConfig, fetch_policy: FetchPolicy) -> Self {
        let known_mev_bots = config.known_mev_bots.iter().cloned().collect();
        Self {
            provider,
            config,
            fetch_policy,
            known_mev_bots,
        }
    }

    pub fn is_known_mev_bot(&self, wallet: &str) -> bool {
        self.known_mev_bots.contains(wallet)
    }

    /// Enrich one wallet; `mint` additionally fetches its current balance
    pub async fn enrich_wallet(&self, wallet: &str, mint: Option<&str>, now_ms: i64) -> WalletEnrichment {
        let age = fetch_with_policy(&self.fetch_policy, "first_activity", || {
            self.provider.first_activity_ms(wallet)
        });
        let history = fetch_with_policy(&self.fetch_policy, "snipe_history", || self.provider.snipe_history(wallet));
        let balance = async {
            match mint {
                Some(mint) => Some(
                    fetch_with_policy(&self.fetch_policy, "token_balance", || {
                        self.provider.token_balance(wallet, mint)
                    })
                    .await,
                ),
                None => None,
            }
        };

        let (age, history, balance) = tokio::join!(age, history, balance);

        let mut enrichment = WalletEnrichment {
            is_known_mev_bot: self.is_known_mev_bot(wallet),
            ..Default::default()
        };

        match age {
            Ok(Some(first_ms)) => {
                let days = ((now_ms - first_ms).max(0)) as f64 / MS_PER_DAY;
                enrichment.wallet_age_days = Some(days);
                enrichment.is_new_wallet = days < self.config.new_wallet_age_days;
            }
            // No history at all: the wallet was created for this buy
            Ok(None) => {
                enrichment.wallet_age_days = Some(0.0);
                enrichment.is_new_wallet = true;
            }
            Err(e) => {
                warn!(wallet, "Wallet age lookup failed: {:#}", e);
                enrichment.failed_lookups.push("first_activity");
            }
        }

        match history {
            Ok(Some(history)) => self.apply_history(&mut enrichment, &history),
            Ok(None) => {}
            Err(e) => {
                warn!(wallet, "Snipe history lookup failed: {:#}", e);
                enrichment.failed_lookups.push("snipe_history");
            }
        }

        match balance {
            Some(Ok(amount)) => enrichment.balance = Some(amount),
            Some(Err(e)) => {
                warn!(wallet, "Token balance lookup failed: {:#}", e);
                enrichment.failed_lookups.push("token_balance");
            }
            None => {}
        }

        enrichment
    }

    fn apply_history(&self, enrichment: &mut WalletEnrichment, history: &SnipeHistory) {
        enrichment.total_sniped = history.total_sniped;
        enrichment.closed_trades = history.positions.len();

        if history.positions.is_empty() {
            return;
        }

        let positions = &history.positions;
        let total_hold_ms: i64 = positions.iter().map(|p| p.hold_time_ms()).sum();
        enrichment.avg_hold_time_minutes = Some(total_hold_ms as f64 / positions.len() as f64 / MS_PER_MINUTE);

        let fast = positions
            .iter()
            .filter(|p| p.hold_time_ms() < self.config.fast_exit_window_ms)
            .count();
        enrichment.fast_exit_ratio = fast as f64 / positions.len() as f64;
        enrichment.is_fast_exiter = positions.len() > self.config.fast_exit_min_trades
            && enrichment.fast_exit_ratio > self.config.fast_exit_ratio;

        let valued: Vec<f64> = positions.iter().filter_map(|p| p.pnl_percent).collect();
        if !valued.is_empty() {
            let wins = valued.iter().filter(|pnl| **pnl > 0.0).count();
            enrichment.win_rate = Some(wins as f64 / valued.len() as f64 * 100.0);
        }
    }

    /// Enrich the leading candidates in place.
    ///
    /// Candidates past `max_enriched_wallets` only get the offline MEV
    /// allowlist check.
    pub async fn enrich_candidates(
        &self,
        candidates: &mut [SniperWallet],
        mint: &str,
        total_supply: f64,
        now_ms: i64,
    ) -> EnrichmentReport {
        let limit = candidates.len().min(self.config.max_enriched_wallets);
        let addresses: Vec<String> = candidates[..limit].iter().map(|c| c.address.clone()).collect();

        let results: HashMap<String, WalletEnrichment> = stream::iter(addresses)
            .map(|address| async move {
                let enrichment = self.enrich_wallet(&address, Some(mint), now_ms).await;
                (address, enrichment)
            })
            .buffer_unordered(self.config.max_concurrent_enrichment.max(1))
            .collect()
            .await;

        let mut report = EnrichmentReport {
            enriched: results.len(),
            skipped: candidates.len() - limit,
            failed_lookups: 0,
        };

        for candidate in candidates.iter_mut() {
            candidate.is_known_mev_bot = self.is_known_mev_bot(&candidate.address);

            let Some(enrichment) = results.get(&candidate.address) else {
                continue;
            };
            report.failed_lookups += enrichment.failed_lookups.len();

            candidate.wallet_age_days = enrichment.wallet_age_days;
            candidate.is_new_wallet = enrichment.is_new_wallet;
            candidate.total_sniped = enrichment.total_sniped;
            candidate.win_rate = enrichment.win_rate;
            candidate.avg_hold_time_minutes = enrichment.avg_hold_time_minutes;
            candidate.is_fast_exiter = enrichment.is_fast_exiter;

            if let Some(balance) = enrichment.balance {
                if total_supply > 0.0 {
                    candidate.percentage_of_supply = balance / total_supply * 100.0;
                }
            }
        }

        debug!(
            mint,
            enriched = report.enriched,
            skipped = report.skipped,
            failed_lookups = report.failed_lookups,
            "Candidate enrichment complete"
        );
        report
    }
}
