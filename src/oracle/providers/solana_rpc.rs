//! On-chain data provider backed by a Solana RPC node
//!
//! # Features
//! - Swap history: `getSignaturesForAddress` on the mint, then
//!   `getTransaction(jsonParsed)`; token-balance deltas per owner become
//!   transfers
//! - Launch-window swaps: signature history paged backwards and cut to the
//!   slots right after creation
//! - Launch info: slot of the mint's oldest signature plus `getTokenSupply`
//! - Wallet age: oldest signature of the wallet (paged backwards)
//! - Balances: `getTokenAccountsByOwner` with a mint filter
//! - Holder count: `getProgramAccounts` on the token program (memcmp on mint)
//!
//! All requests share one `governor` rate limiter.

use super::{HolderCountProvider, LaunchInfoProvider, SwapHistoryProvider, WalletIntelProvider};
use crate::oracle::types::{SnipeHistory, SwapEvent, TokenLaunchInfo, TokenTransfer};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::{RpcProgramAccountsConfig, RpcTransactionConfig};
use solana_client::rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType};
use solana_client::rpc_request::TokenAccountsFilter;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiMessage, UiTransactionEncoding,
    UiTransactionTokenBalance,
};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Maximum page size accepted by `getSignaturesForAddress`
const SIGNATURE_PAGE_SIZE: usize = 1000;

/// SPL token account size in bytes
const TOKEN_ACCOUNT_SIZE: u64 = 165;

/// Deltas smaller than this are rounding noise
const BALANCE_EPSILON: f64 = 1e-9;

/// Accounts that hold tokens without being holders
const EXCLUDED_HOLDERS: &[&str] = &[
    "11111111111111111111111111111111",
    "1nc1nerator11111111111111111111111111111111",
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
    "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
];

/// RPC connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
    /// processed | confirmed | finalized
    pub commitment: String,
    /// HTTP timeout per request (seconds)
    pub timeout_secs: u64,
    /// Shared request budget
    pub requests_per_second: u32,
    /// Pages of 1000 signatures walked when looking for the oldest one
    pub max_signature_pages: usize,
    /// Transactions fetched concurrently when building swap history
    pub max_parallel_tx_fetches: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            timeout_secs: 30,
            requests_per_second: 10,
            max_signature_pages: 10,
            max_parallel_tx_fetches: 8,
        }
    }
}

impl RpcConfig {
    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        let commitment = match self.commitment.to_lowercase().as_str() {
            "processed" => CommitmentLevel::Processed,
            "confirmed" => CommitmentLevel::Confirmed,
            "finalized" => CommitmentLevel::Finalized,
            other => bail!("Unknown commitment level: {}", other),
        };
        Ok(CommitmentConfig { commitment })
    }
}

/// Solana RPC backed swap, launch and wallet provider
pub struct SolanaRpcProvider {
    config: RpcConfig,
    rpc_client: Arc<RpcClient>,
    commitment: CommitmentConfig,
    rate_limiter: Arc<DirectRateLimiter>,
}

impl SolanaRpcProvider {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let commitment = config.commitment_config()?;
        let rpc_client = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            commitment,
        ));
        Self::with_client(config, rpc_client)
    }

    /// Reuse an existing client (shared connection pool)
    pub fn with_client(config: RpcConfig, rpc_client: Arc<RpcClient>) -> Result<Self> {
        let commitment = config.commitment_config()?;
        let rate = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| anyhow!("requests_per_second must be non-zero"))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        info!(
            "Initialized SolanaRpcProvider: url={}, rate_limit={}/s, commitment={}",
            config.url, config.requests_per_second, config.commitment
        );

        Ok(Self {
            config,
            rpc_client,
            commitment,
            rate_limiter,
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    async fn signatures_page(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>> {
        self.rate_limiter.until_ready().await;
        let config = GetConfirmedSignaturesForAddress2Config {
            before,
            until: None,
            limit: Some(limit.min(SIGNATURE_PAGE_SIZE)),
            commitment: Some(self.commitment),
        };
        self.rpc_client
            .get_signatures_for_address_with_config(address, config)
            .await
            .with_context(|| format!("getSignaturesForAddress failed for {}", address))
    }

    /// Oldest signature reachable within `max_signature_pages`
    async fn oldest_signature(&self, address: &Pubkey) -> Result<Option<RpcConfirmedTransactionStatusWithSignature>> {
        let mut before = None;
        let mut oldest = None;

        for page_index in 0..self.config.max_signature_pages.max(1) {
            let page = self.signatures_page(address, before, SIGNATURE_PAGE_SIZE).await?;
            let page_len = page.len();

            if let Some(last) = page.into_iter().last() {
                before = Some(
                    Signature::from_str(&last.signature)
                        .with_context(|| format!("Invalid signature {}", last.signature))?,
                );
                oldest = Some(last);
            }

            if page_len < SIGNATURE_PAGE_SIZE {
                return Ok(oldest);
            }
            debug!(address = %address, page = page_index + 1, "Walking signature history backwards");
        }

        warn!(
            address = %address,
            pages = self.config.max_signature_pages,
            "Signature history longer than page budget; oldest seen is a lower bound"
        );
        Ok(oldest)
    }

    /// Signatures in `from_slot..=to_slot`, oldest first, walking back at
    /// most `max_signature_pages` pages
    async fn signatures_in_slot_window(
        &self,
        address: &Pubkey,
        from_slot: u64,
        to_slot: u64,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>> {
        let mut before = None;
        let mut window = Vec::new();

        for page_index in 0..self.config.max_signature_pages.max(1) {
            let page = self.signatures_page(address, before, SIGNATURE_PAGE_SIZE).await?;
            let page_len = page.len();
            let Some(last) = page.last() else {
                break;
            };
            let reached_launch = last.slot < from_slot;
            before = Some(
                Signature::from_str(&last.signature).with_context(|| format!("Invalid signature {}", last.signature))?,
            );

            window.extend(
                page.into_iter()
                    .filter(|status| status.slot >= from_slot && status.slot <= to_slot),
            );

            if reached_launch || page_len < SIGNATURE_PAGE_SIZE {
                window.reverse();
                return Ok(window);
            }
            debug!(address = %address, page = page_index + 1, "Walking back to the launch window");
        }

        warn!(
            address = %address,
            pages = self.config.max_signature_pages,
            "Launch window not reached within page budget; early swaps may be missing"
        );
        window.reverse();
        Ok(window)
    }

    /// Fetch and decode the successful transactions among `statuses`,
    /// sorted by slot
    async fn swaps_from_signatures(
        &self,
        mint: &str,
        statuses: Vec<RpcConfirmedTransactionStatusWithSignature>,
    ) -> Vec<SwapEvent> {
        let statuses: Vec<RpcConfirmedTransactionStatusWithSignature> =
            statuses.into_iter().filter(|s| s.err.is_none()).collect();

        let mut swaps: Vec<SwapEvent> = stream::iter(statuses)
            .map(|status| async move {
                let result = self.fetch_swap(mint, &status).await;
                (status.signature, result)
            })
            .buffer_unordered(self.config.max_parallel_tx_fetches.max(1))
            .filter_map(|(signature, result)| async move {
                match result {
                    Ok(event) => event,
                    Err(e) => {
                        debug!(signature = %signature, "Skipping transaction: {:#}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        swaps.sort_by(|a, b| {
            (a.slot, a.timestamp_ms)
                .cmp(&(b.slot, b.timestamp_ms))
                .then_with(|| a.signature.cmp(&b.signature))
        });
        swaps
    }

    async fn fetch_swap(
        &self,
        mint: &str,
        status: &RpcConfirmedTransactionStatusWithSignature,
    ) -> Result<Option<SwapEvent>> {
        let signature = Signature::from_str(&status.signature)
            .with_context(|| format!("Invalid signature {}", status.signature))?;

        self.rate_limiter.until_ready().await;
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };
        let tx = self
            .rpc_client
            .get_transaction_with_config(&signature, config)
            .await
            .with_context(|| format!("getTransaction failed for {}", status.signature))?;

        Ok(swap_event_from_transaction(mint, &status.signature, status.block_time, &tx))
    }
}

/// Owner of an SPL token account with a non-zero balance.
///
/// Layout: mint(32) | owner(32) | amount(8, LE) | ...
fn holder_from_account_data(data: &[u8]) -> Option<Pubkey> {
    if data.len() < 72 {
        return None;
    }
    let amount_bytes: [u8; 8] = data[64..72].try_into().ok()?;
    if u64::from_le_bytes(amount_bytes) == 0 {
        return None;
    }
    Pubkey::try_from(&data[32..64]).ok()
}

fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address).with_context(|| format!("Invalid pubkey: {}", address))
}

fn transaction_account_keys(tx: &EncodedTransaction) -> Vec<String> {
    match tx {
        EncodedTransaction::Json(ui_tx) => match &ui_tx.message {
            UiMessage::Parsed(message) => message.account_keys.iter().map(|k| k.pubkey.clone()).collect(),
            UiMessage::Raw(message) => message.account_keys.clone(),
        },
        _ => Vec::new(),
    }
}

/// Summed UI balance of `mint` per owner
fn owner_balances(
    balances: &OptionSerializer<Vec<UiTransactionTokenBalance>>,
    mint: &str,
    account_keys: &[String],
) -> HashMap<String, f64> {
    let mut by_owner: HashMap<String, f64> = HashMap::new();
    let OptionSerializer::Some(balances) = balances else {
        return by_owner;
    };

    for balance in balances.iter().filter(|b| b.mint == mint) {
        let owner = match &balance.owner {
            OptionSerializer::Some(owner) => owner.clone(),
            _ => match account_keys.get(balance.account_index as usize) {
                Some(key) => key.clone(),
                None => continue,
            },
        };
        let amount = balance
            .ui_token_amount
            .ui_amount
            .or_else(|| balance.ui_token_amount.ui_amount_string.parse().ok())
            .unwrap_or(0.0);
        *by_owner.entry(owner).or_default() += amount;
    }

    by_owner
}

fn swap_event_from_transaction(
    mint: &str,
    signature: &str,
    fallback_block_time: Option<i64>,
    tx: &EncodedConfirmedTransactionWithStatusMeta,
) -> Option<SwapEvent> {
    let meta = tx.transaction.meta.as_ref()?;
    if meta.err.is_some() {
        return None;
    }

    let account_keys = transaction_account_keys(&tx.transaction.transaction);
    let pre = owner_balances(&meta.pre_token_balances, mint, &account_keys);
    let post = owner_balances(&meta.post_token_balances, mint, &account_keys);

    let owners: HashSet<&String> = pre.keys().chain(post.keys()).collect();
    let deltas: Vec<(String, f64)> = owners
        .into_iter()
        .map(|owner| {
            let before = pre.get(owner).copied().unwrap_or(0.0);
            let after = post.get(owner).copied().unwrap_or(0.0);
            (owner.clone(), after - before)
        })
        .collect();

    let transfers = transfers_from_deltas(mint, deltas);
    if transfers.is_empty() {
        return None;
    }

    let timestamp_ms = tx.block_time.or(fallback_block_time).unwrap_or(0) * 1000;

    Some(SwapEvent {
        signature: signature.to_string(),
        timestamp_ms,
        slot: tx.slot,
        transfers,
        account_keys,
    })
}

/// Pair balance decreases with increases, largest first, into transfers.
///
/// Mints and burns leave one side unmatched and produce no transfer.
pub(crate) fn transfers_from_deltas(mint: &str, deltas: Vec<(String, f64)>) -> Vec<TokenTransfer> {
    let by_size = |a: &(String, f64), b: &(String, f64)| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0));

    let mut senders: Vec<(String, f64)> = deltas
        .iter()
        .filter(|(_, d)| *d < -BALANCE_EPSILON)
        .map(|(owner, d)| (owner.clone(), -d))
        .collect();
    let mut receivers: Vec<(String, f64)> = deltas
        .into_iter()
        .filter(|(_, d)| *d > BALANCE_EPSILON)
        .collect();
    senders.sort_by(by_size);
    receivers.sort_by(by_size);

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < senders.len() && j < receivers.len() {
        let amount = senders[i].1.min(receivers[j].1);
        if amount > BALANCE_EPSILON {
            transfers.push(TokenTransfer::new(mint, &senders[i].0, &receivers[j].0, amount));
        }
        senders[i].1 -= amount;
        receivers[j].1 -= amount;
        if senders[i].1 <= BALANCE_EPSILON {
            i += 1;
        }
        if receivers[j].1 <= BALANCE_EPSILON {
            j += 1;
        }
    }

    transfers
}

#[async_trait]
impl SwapHistoryProvider for SolanaRpcProvider {
    #[instrument(skip(self))]
    async fn recent_swaps(&self, mint: &str, limit: usize) -> Result<Vec<SwapEvent>> {
        let mint_pubkey = parse_pubkey(mint)?;
        let signatures = self.signatures_page(&mint_pubkey, None, limit).await?;
        let total = signatures.len();

        let swaps = self.swaps_from_signatures(mint, signatures).await;
        debug!(mint, signatures = total, swaps = swaps.len(), "Fetched swap history");
        Ok(swaps)
    }

    #[instrument(skip(self))]
    async fn launch_swaps(
        &self,
        mint: &str,
        creation_slot: u64,
        max_blocks: u64,
        limit: usize,
    ) -> Result<Vec<SwapEvent>> {
        let mint_pubkey = parse_pubkey(mint)?;
        let mut signatures = self
            .signatures_in_slot_window(&mint_pubkey, creation_slot, creation_slot.saturating_add(max_blocks))
            .await?;
        signatures.truncate(limit);
        let total = signatures.len();

        let swaps = self.swaps_from_signatures(mint, signatures).await;
        debug!(mint, creation_slot, signatures = total, swaps = swaps.len(), "Fetched launch-window swaps");
        Ok(swaps)
    }
}

#[async_trait]
impl HolderCountProvider for SolanaRpcProvider {
    /// Distinct owners with a non-zero balance of `mint`
    #[instrument(skip(self))]
    async fn holder_count(&self, mint: &str) -> Result<u64> {
        let mint_pubkey = parse_pubkey(mint)?;

        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::Memcmp(Memcmp::new(0, MemcmpEncodedBytes::Bytes(mint_pubkey.to_bytes().to_vec()))),
                RpcFilterType::DataSize(TOKEN_ACCOUNT_SIZE),
            ]),
            account_config: Default::default(),
            ..Default::default()
        };

        self.rate_limiter.until_ready().await;
        let token_program = solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
        let accounts = self
            .rpc_client
            .get_program_accounts_with_config(&token_program, config)
            .await
            .context("Failed to fetch token accounts")?;

        let owners: HashSet<Pubkey> = accounts
            .iter()
            .filter_map(|(_, account)| holder_from_account_data(&account.data))
            .filter(|owner| !EXCLUDED_HOLDERS.contains(&owner.to_string().as_str()))
            .collect();

        debug!(mint, accounts = accounts.len(), holders = owners.len(), "Counted holders");
        Ok(owners.len() as u64)
    }
}

#[async_trait]
impl LaunchInfoProvider for SolanaRpcProvider {
    #[instrument(skip(self))]
    async fn launch_info(&self, mint: &str) -> Result<TokenLaunchInfo> {
        let mint_pubkey = parse_pubkey(mint)?;

        let oldest = self
            .oldest_signature(&mint_pubkey)
            .await?
            .ok_or_else(|| anyhow!("No transactions found for mint {}", mint))?;

        self.rate_limiter.until_ready().await;
        let supply = self
            .rpc_client
            .get_token_supply(&mint_pubkey)
            .await
            .with_context(|| format!("getTokenSupply failed for {}", mint))?;
        let total_supply = supply
            .ui_amount
            .or_else(|| supply.ui_amount_string.parse().ok())
            .unwrap_or(0.0);

        Ok(TokenLaunchInfo {
            creation_slot: oldest.slot,
            creation_time_ms: oldest.block_time.map(|t| t * 1000),
            total_supply,
        })
    }
}

#[async_trait]
impl WalletIntelProvider for SolanaRpcProvider {
    async fn first_activity_ms(&self, wallet: &str) -> Result<Option<i64>> {
        let wallet_pubkey = parse_pubkey(wallet)?;
        let oldest = self.oldest_signature(&wallet_pubkey).await?;
        Ok(oldest.and_then(|s| s.block_time).map(|t| t * 1000))
    }

    /// Past launch performance needs an indexer; nothing on-chain answers it
    /// cheaply, so the history is reported as unavailable.
    async fn snipe_history(&self, _wallet: &str) -> Result<Option<SnipeHistory>> {
        Ok(None)
    }

    async fn token_balance(&self, wallet: &str, mint: &str) -> Result<f64> {
        let owner = parse_pubkey(wallet)?;
        let mint_pubkey = parse_pubkey(mint)?;

        self.rate_limiter.until_ready().await;
        let accounts = self
            .rpc_client
            .get_token_accounts_by_owner(&owner, TokenAccountsFilter::Mint(mint_pubkey))
            .await
            .with_context(|| format!("getTokenAccountsByOwner failed for {}", wallet))?;

        let balance = accounts
            .iter()
            .filter_map(|keyed| match &keyed.account.data {
                UiAccountData::Json(parsed) => parsed_ui_amount(&parsed.parsed),
                _ => None,
            })
            .sum();

        Ok(balance)
    }
}

/// `info.tokenAmount.uiAmount` of a jsonParsed token account
fn parsed_ui_amount(parsed: &serde_json::Value) -> Option<f64> {
    let token_amount = parsed.get("info")?.get("tokenAmount")?;
    token_amount
        .get("uiAmount")
        .and_then(|v| v.as_f64())
        .or_else(|| token_amount.get("uiAmountString")?.as_str()?.parse().ok())
}
