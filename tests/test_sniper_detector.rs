//! Integration tests for sniper & MEV detection
//!
//! Launch scenarios scripted through in-memory providers

mod common;

use common::{buy, engine, engine_with, MockChain, MINT};
use launch_risk_oracle::config::EngineConfig;
use launch_risk_oracle::oracle::sniper::JITO_TIP_ACCOUNTS;
use launch_risk_oracle::oracle::{
    warning_codes, ClosedPosition, SnipeHistory, SniperRisk, TokenLaunchInfo, WalletLabel,
};
use std::sync::Arc;

const CREATION_SLOT: u64 = 5_000;
const SUPPLY: f64 = 1_000_000_000.0;
const DAY_MS: i64 = 86_400_000;

fn launch() -> TokenLaunchInfo {
    TokenLaunchInfo {
        creation_slot: CREATION_SLOT,
        creation_time_ms: Some(1_700_000_000_000),
        total_supply: SUPPLY,
    }
}

fn config_with_bots(bots: &[&str]) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.sniper.known_mev_bots = bots.iter().map(|b| b.to_string()).collect();
    config
}

#[tokio::test]
async fn test_block0_swarm_is_high_risk() {
    let buyers: Vec<String> = (0..6).map(|i| format!("sniper{}", i)).collect();
    let swaps = buyers
        .iter()
        .enumerate()
        .map(|(i, w)| buy(&format!("sig{}", i), CREATION_SLOT, 0, w, 1_234_567.0))
        .collect();

    let mut chain = MockChain {
        swaps,
        launch: Some(launch()),
        ..Default::default()
    };
    // 10% + 5 x 5% = 35% of supply still held
    for (i, wallet) in buyers.iter().enumerate() {
        let share = if i == 0 { 0.10 } else { 0.05 };
        chain.balances.insert(wallet.clone(), SUPPLY * share);
        chain.first_activity.insert(wallet.clone(), 0);
    }

    let engine = engine_with(Arc::new(chain), config_with_bots(&["sniper0", "sniper1"]));
    let analysis = engine.analyze_snipers(MINT).await;

    assert_eq!(analysis.creation_slot, Some(CREATION_SLOT));
    assert_eq!(analysis.total_snipers, 6);
    assert_eq!(analysis.block0_buyers, 6);
    assert_eq!(analysis.known_mev_bots, 2);
    assert!((analysis.sniper_supply_percent - 35.0).abs() < 1e-6);
    assert!(matches!(analysis.sniper_risk, SniperRisk::High | SniperRisk::Critical));
    assert!(analysis
        .red_flags
        .iter()
        .any(|f| f.contains("bought in the same block as launch")));
    assert!(analysis.dump_probability <= 100);
    assert!(analysis.sniper_score <= 100);

    // MEV bots score highest
    assert!(analysis.snipers[0].is_known_mev_bot);
}

#[tokio::test]
async fn test_launch_window_survives_long_trading_history() {
    let mut swaps: Vec<_> = (0..6)
        .map(|i| buy(&format!("launch{}", i), CREATION_SLOT, 0, &format!("sniper{}", i), 2_500_000.0))
        .collect();
    // Far more later retail flow than one swap page holds
    swaps.extend((0..250u64).map(|i| {
        buy(
            &format!("retail{}", i),
            CREATION_SLOT + 40 + i,
            (i as i64 + 1) * 400,
            &format!("retail{}", i),
            1_000.0 + i as f64,
        )
    }));

    let chain = Arc::new(MockChain {
        swaps,
        launch: Some(launch()),
        ..Default::default()
    });
    let analysis = engine(chain.clone()).analyze_snipers(MINT).await;

    assert_eq!(analysis.block0_buyers, 6);
    assert_eq!(analysis.total_snipers, 6);
    assert_ne!(analysis.sniper_risk, SniperRisk::None);
    assert!(analysis.snipers.iter().all(|w| w.address.starts_with("sniper")));
    assert_eq!(chain.swap_calls(), 1);
}

#[tokio::test]
async fn test_worst_case_wallet_scores_100() {
    let mut bundled = buy("bundle", CREATION_SLOT, 0, "mevbot", 1_000_000.0);
    bundled.account_keys.push(JITO_TIP_ACCOUNTS[3].to_string());

    let chain = Arc::new(MockChain {
        swaps: vec![bundled, buy("late", CREATION_SLOT + 4, 1_600, "human", 1_234.5)],
        launch: Some(launch()),
        ..Default::default()
    });

    let analysis = engine_with(chain, config_with_bots(&["mevbot"])).analyze_snipers(MINT).await;
    let bot = analysis.snipers.iter().find(|w| w.address == "mevbot").unwrap();

    assert!(bot.is_jito_bundled);
    assert!(bot.is_known_mev_bot);
    assert!(bot.is_precise_amount);
    assert_eq!(bot.blocks_from_launch, 0);
    assert_eq!(bot.sniper_score, 100);
    assert_eq!(analysis.jito_bundled, 1);
}

#[tokio::test]
async fn test_late_buyers_are_not_snipers() {
    let chain = Arc::new(MockChain {
        swaps: vec![
            buy("a", CREATION_SLOT + 7, 0, "patient", 1_234.5),
            buy("b", CREATION_SLOT + 50, 0, "later", 99.0),
        ],
        launch: Some(launch()),
        ..Default::default()
    });

    let analysis = engine(chain).analyze_snipers(MINT).await;
    assert_eq!(analysis.total_snipers, 0);
    assert_eq!(analysis.sniper_risk, SniperRisk::None);
    assert_eq!(analysis.dump_probability, 0);
}

#[tokio::test]
async fn test_enrichment_is_capped() {
    let swaps = (0..30)
        .map(|i| buy(&format!("sig{}", i), CREATION_SLOT + (i % 3), 0, &format!("w{}", i), 100.0 + i as f64))
        .collect();
    let chain = Arc::new(MockChain {
        swaps,
        launch: Some(launch()),
        ..Default::default()
    });

    let analysis = engine(chain.clone()).analyze_snipers(MINT).await;
    assert_eq!(analysis.total_snipers, 30);
    assert_eq!(chain.wallet_calls(), 20);
}

#[tokio::test]
async fn test_unknown_creation_block() {
    let chain = Arc::new(MockChain {
        swaps: vec![buy("a", 1, 0, "buyer", 10.0)],
        launch: None,
        ..Default::default()
    });

    let analysis = engine(chain).analyze_snipers(MINT).await;
    assert_eq!(analysis.sniper_score, 0);
    assert_eq!(analysis.sniper_risk, SniperRisk::None);
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.code == warning_codes::CREATION_BLOCK_UNKNOWN));
}

#[tokio::test]
async fn test_no_swaps_for_token() {
    let chain = Arc::new(MockChain {
        launch: Some(launch()),
        ..Default::default()
    });

    let analysis = engine(chain).analyze_snipers(MINT).await;
    assert_eq!(analysis.total_snipers, 0);
    assert!(analysis.warnings.iter().any(|w| w.code == warning_codes::NO_SWAP_DATA));
}

#[tokio::test]
async fn test_wallet_profile_for_serial_sniper() {
    let now = chrono::Utc::now().timestamp_millis();
    let positions = (0..8)
        .map(|i| ClosedPosition {
            entry_ms: now - (i + 1) * DAY_MS,
            exit_ms: now - (i + 1) * DAY_MS + 5 * 60_000,
            pnl_percent: Some(if i < 6 { 120.0 } else { -40.0 }),
        })
        .collect();

    let mut chain = MockChain::default();
    chain.first_activity.insert("serial".into(), now - 30 * DAY_MS);
    chain.histories.insert(
        "serial".into(),
        SnipeHistory {
            total_sniped: 8,
            positions,
        },
    );
    let chain = Arc::new(chain);
    let engine = engine(chain.clone());

    let profile = engine.get_wallet_sniper_score("serial").await;
    assert_eq!(profile.label, WalletLabel::SerialSniper);
    assert_eq!(profile.win_rate, Some(75.0));
    assert!(profile.is_fast_exiter);
    assert!(!profile.is_new_wallet);
    // fast exiter 10 + proven winner 10 + min(24, 35)
    assert_eq!(profile.reputation_score, 44);
    assert!(!profile.cached);

    let again = engine.get_wallet_sniper_score("serial").await;
    assert!(again.cached);
    assert_eq!(chain.wallet_calls(), 1);
}

#[tokio::test]
async fn test_wallet_without_history_reports_unavailable_win_rate() {
    let chain = Arc::new(MockChain::default());
    let profile = engine(chain).get_wallet_sniper_score("stranger").await;

    assert!(profile.win_rate.is_none());
    // No activity at all: brand new wallet
    assert!(profile.is_new_wallet);
    assert_eq!(profile.label, WalletLabel::FreshWallet);
    assert!(profile
        .warnings
        .iter()
        .any(|w| w.code == warning_codes::INSUFFICIENT_DATA));
}
