//! Oracle module - launch manipulation analysis
//!
//! Wash-trading and sniper/MEV verdicts for freshly launched Solana tokens,
//! the upstream providers they read from, and the caching engine that serves
//! them.

pub mod analysis_cache; // TTL cache with single-flight computation
pub mod engine; // Public entry point
pub mod providers; // Swap history, market stats, launch info, wallet intel
pub mod sniper; // Sniper & MEV detection
pub mod timeline; // Per-wallet buy/sell timelines
pub mod types;
pub mod wash_trading; // Wash trading detection

// Re-export main types
pub use analysis_cache::{AnalysisCache, CacheMetricsSnapshot};
pub use engine::{EngineCacheStats, LaunchRiskEngine};
pub use providers::{
    CompositeMarketStats, DexScreenerClient, DexScreenerConfig, HolderCountProvider, LaunchInfoProvider, MarketStatsProvider, Providers,
    RpcConfig, SolanaRpcProvider, SwapHistoryProvider, WalletIntelProvider,
};
pub use sniper::{
    SniperAnalysis, SniperConfig, SniperDetector, SniperRisk, SniperWallet, WalletLabel, WalletSniperProfile,
};
pub use types::{
    warning_codes, AnalysisWarning, ClosedPosition, Severity, SnipeHistory, SwapEvent, TokenLaunchInfo,
    TokenMarketStats, TokenTransfer, TxSignature, WalletAddress,
};
pub use wash_trading::{
    CircularPattern, IntervalAnomaly, SelfTrade, VolumeAnomalyData, WashRiskLevel, WashTradingAnalysis,
    WashTradingConfig, WashTradingDetector,
};
