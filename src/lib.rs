//! Launch Risk Oracle - manipulation analysis for freshly launched Solana tokens
//!
//! Produces two independent verdicts per token:
//! - **Wash trading**: is reported volume fake? (self-trades, transfer cycles,
//!   bot-like timing, volume out of line with price and holders)
//! - **Snipers / MEV**: did bots capture the launch, and are they likely to dump?
//!
//! Start from [`LaunchRiskEngine`].

pub mod config;
pub mod observability;
pub mod oracle;
pub mod utils;

// Re-export main types for convenience
pub use config::{CacheConfig, EngineConfig};
pub use observability::{init_logging, EngineMetrics, LoggingConfig};
pub use oracle::{LaunchRiskEngine, Providers, SniperAnalysis, WalletSniperProfile, WashTradingAnalysis};
