//! CLI for the Launch Risk Oracle
//!
//! Runs wash-trading, sniper and wallet analyses against a live Solana RPC
//! node and DEX Screener and prints the verdicts as JSON.

use anyhow::{Context, Result};
use launch_risk_oracle::config::EngineConfig;
use launch_risk_oracle::observability::init_logging;
use launch_risk_oracle::oracle::LaunchRiskEngine;
use serde::Serialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }

    let config = load_config()?;
    init_logging(&config.logging)?;

    let command = &args[1];

    match command.as_str() {
        "wash" | "snipers" | "wallet" => {
            let Some(address) = args.get(2) else {
                eprintln!("Usage: {} {} <address>", args[0], command);
                return Ok(());
            };
            let engine = LaunchRiskEngine::solana(config)?;

            match command.as_str() {
                "wash" => {
                    let analysis = engine.analyze_wash_trading(address).await;
                    eprintln!("{}", analysis.summary());
                    print_json(&analysis)?;
                }
                "snipers" => {
                    let analysis = engine.analyze_snipers(address).await;
                    eprintln!("{}", analysis.summary());
                    print_json(&analysis)?;
                }
                _ => {
                    let profile = engine.get_wallet_sniper_score(address).await;
                    print_json(&profile)?;
                }
            }
        }
        "batch" => {
            let mints: Vec<String> = args.iter().skip(2).cloned().collect();
            if mints.is_empty() {
                eprintln!("Usage: {} batch <mint> [mint...]", args[0]);
                return Ok(());
            }
            let engine = LaunchRiskEngine::solana(config)?;

            let (wash, snipers) = tokio::join!(
                engine.analyze_wash_trading_batch(&mints, 4),
                engine.analyze_snipers_batch(&mints, 4)
            );
            for (wash, snipers) in wash.iter().zip(snipers.iter()) {
                println!("{}", wash.token_mint);
                println!("  wash:    {}", wash.summary());
                println!("  snipers: {}", snipers.summary());
            }
        }
        "metrics" => {
            let mints: Vec<String> = args.iter().skip(2).cloned().collect();
            let engine = LaunchRiskEngine::solana(config)?;
            for mint in &mints {
                engine.analyze_wash_trading(mint).await;
                engine.analyze_snipers(mint).await;
            }
            print!("{}", engine.metrics().gather());
            print_json(&engine.cache_stats().await)?;
        }
        "config" => {
            println!("{}", toml::to_string_pretty(&config.redacted())?);
        }
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage(&args[0]);
        }
    }

    Ok(())
}

/// `CONFIG_PATH` or ./config.toml when present, defaults otherwise
fn load_config() -> Result<EngineConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if Path::new(&path).exists() {
        return EngineConfig::from_toml_file(&path).with_context(|| format!("Failed to load {}", path));
    }

    let mut config = EngineConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage(program_name: &str) {
    println!("Launch Risk Oracle CLI");
    println!("Wash-trading and sniper/MEV analysis for freshly launched Solana tokens");
    println!();
    println!("USAGE:");
    println!("    {} <COMMAND> [OPTIONS]", program_name);
    println!();
    println!("COMMANDS:");
    println!("    wash <mint>             Wash-trading analysis");
    println!("    snipers <mint>          Sniper/MEV analysis");
    println!("    wallet <address>        Sniper reputation of a wallet");
    println!("    batch <mint> [mint...]  Both analyses for several tokens");
    println!("    metrics [mint...]       Analyse the mints, then print Prometheus metrics");
    println!("    config                  Print the effective configuration");
    println!("    help                    Show this help message");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    CONFIG_PATH            Configuration file (default: config.toml)");
    println!("    RPC_URL                Solana RPC endpoint");
    println!("    DEXSCREENER_BASE_URL   DEX Screener API base URL");
    println!("    KNOWN_MEV_BOTS         Comma separated MEV bot wallets");
    println!("    LOG_LEVEL / RUST_LOG   Log level (info, debug, trace)");
}
