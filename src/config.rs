//! Engine configuration
//!
//! One TOML document groups every tunable of the engine. Secrets and
//! deployment-specific endpoints can be overridden from the environment:
//!
//! | Variable               | Field                         |
//! |------------------------|-------------------------------|
//! | `RPC_URL`              | `rpc.url`                     |
//! | `DEXSCREENER_BASE_URL` | `dex_screener.base_url`       |
//! | `DEXSCREENER_API_KEY`  | `dex_screener.api_key`        |
//! | `LOG_LEVEL`            | `logging.level`               |
//! | `KNOWN_MEV_BOTS`       | `sniper.known_mev_bots` (comma separated, appended) |

use crate::observability::LoggingConfig;
use crate::oracle::providers::dex_screener::DexScreenerConfig;
use crate::oracle::providers::solana_rpc::RpcConfig;
use crate::oracle::sniper::SniperConfig;
use crate::oracle::wash_trading::{WashTradingConfig, MAX_CYCLE_WALLETS};
use crate::utils::retry::FetchPolicy;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

const REDACTED: &str = "<redacted>";

/// TTLs and capacity of the analysis caches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Wash and sniper analyses (seconds)
    pub token_ttl_secs: u64,
    /// Wallet sniper profiles (seconds)
    pub wallet_ttl_secs: u64,
    /// Entries per cache
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 5 * 60,
            wallet_ttl_secs: 30 * 60,
            max_capacity: 10_000,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub wash_trading: WashTradingConfig,
    pub sniper: SniperConfig,
    pub cache: CacheConfig,
    pub fetch: FetchPolicy,
    pub logging: LoggingConfig,
    pub rpc: RpcConfig,
    pub dex_screener: DexScreenerConfig,
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse engine configuration")
    }

    /// Load from a TOML file, apply environment overrides and validate
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rpc_url) = lookup("RPC_URL") {
            self.rpc.url = rpc_url;
        }
        if let Some(base_url) = lookup("DEXSCREENER_BASE_URL") {
            self.dex_screener.base_url = base_url;
        }
        if let Some(api_key) = lookup("DEXSCREENER_API_KEY").filter(|k| !k.is_empty()) {
            self.dex_screener.api_key = Some(api_key);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(bots) = lookup("KNOWN_MEV_BOTS") {
            for bot in bots.split(',').map(str::trim).filter(|b| !b.is_empty()) {
                if !self.sniper.known_mev_bots.iter().any(|known| known == bot) {
                    self.sniper.known_mev_bots.push(bot.to_string());
                }
            }
        }
    }

    /// Copy safe to print: secrets replaced by a marker
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.dex_screener.api_key.is_some() {
            config.dex_screener.api_key = Some(REDACTED.to_string());
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.rpc.url).context("rpc.url")?;
        validate_endpoint(&self.dex_screener.base_url).context("dex_screener.base_url")?;
        self.rpc.commitment_config()?;

        let wash = &self.wash_trading;
        if wash.self_trade_window_ms <= 0 {
            bail!("wash_trading.self_trade_window_ms must be positive");
        }
        if wash.min_cycle_length < 2
            || wash.min_cycle_length > wash.max_cycle_length
            || wash.max_cycle_length > MAX_CYCLE_WALLETS
        {
            bail!(
                "wash_trading cycle lengths must satisfy 2 <= min ({}) <= max ({}) <= {}",
                wash.min_cycle_length,
                wash.max_cycle_length,
                MAX_CYCLE_WALLETS
            );
        }
        if wash.max_swaps == 0 {
            bail!("wash_trading.max_swaps must be at least 1");
        }

        let sniper = &self.sniper;
        if sniper.max_swaps == 0 {
            bail!("sniper.max_swaps must be at least 1");
        }
        if sniper.max_concurrent_enrichment == 0 {
            bail!("sniper.max_concurrent_enrichment must be at least 1");
        }
        if !(0.0..=1.0).contains(&sniper.fast_exit_ratio) {
            bail!("sniper.fast_exit_ratio must be within 0.0-1.0");
        }
        if sniper.sniper_block_threshold > sniper.max_blocks_from_launch {
            bail!("sniper.sniper_block_threshold cannot exceed max_blocks_from_launch");
        }

        if self.cache.token_ttl_secs == 0 || self.cache.wallet_ttl_secs == 0 {
            bail!("cache TTLs must be positive");
        }
        if self.fetch.max_attempts == 0 || self.fetch.timeout_ms == 0 {
            bail!("fetch.max_attempts and fetch.timeout_ms must be positive");
        }

        Ok(())
    }
}

/// HTTPS only, except for local endpoints
fn validate_endpoint(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str).map_err(|e| anyhow!("Invalid URL format: {}", e))?;
    let host = url.host_str().unwrap_or("");
    if url.scheme() != "https" && host != "localhost" && !host.starts_with("127.") {
        bail!("Endpoint must use HTTPS: {}", url_str);
    }
    Ok(())
}
