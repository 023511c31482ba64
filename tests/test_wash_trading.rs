//! Integration tests for wash-trading analysis
//!
//! Drives the engine end to end with scripted swap histories

mod common;

use common::{buy, engine, quiet_market, sell, transfer, MockChain, MINT};
use launch_risk_oracle::oracle::{warning_codes, Severity, WashRiskLevel};
use std::sync::Arc;

const MINUTE: i64 = 60_000;

#[tokio::test]
async fn test_twelve_self_trades_are_critical() {
    let mut swaps = Vec::new();
    for i in 0..12 {
        let wallet = format!("washer{}", i);
        let t = i as i64 * 10 * MINUTE;
        swaps.push(buy(&format!("b{}", i), 100 + i * 30, t, &wallet, 1_000.0));
        swaps.push(sell(&format!("s{}", i), 101 + i * 30, t + MINUTE, &wallet, 1_000.0));
    }

    let chain = Arc::new(MockChain {
        swaps,
        market: Some(quiet_market()),
        ..Default::default()
    });
    let analysis = engine(chain).analyze_wash_trading(MINT).await;

    assert_eq!(analysis.self_trades.len(), 12);
    assert_eq!(analysis.breakdown.self_trade_points, 30.0);
    assert!(analysis.wash_score >= 30);

    let warning = analysis
        .warnings
        .iter()
        .find(|w| w.code == warning_codes::SELF_TRADING)
        .expect("self-trading warning");
    assert_eq!(warning.severity, Severity::Critical);

    for trade in &analysis.self_trades {
        assert_eq!(trade.time_between_ms, MINUTE);
        assert_eq!(trade.suspicion_score, 90);
    }
}

#[tokio::test]
async fn test_organic_trading_scores_zero() {
    // Thirteen quick buys then a long pause: irregular cadence
    let mut swaps = Vec::new();
    let mut t = 0;
    for i in 0..15 {
        swaps.push(buy(&format!("b{}", i), 100 + i, t, &format!("holder{}", i), 500.0 + i as f64));
        t += if i == 13 { 1_000_000 } else { 1_000 };
    }

    let chain = Arc::new(MockChain {
        swaps,
        market: Some(quiet_market()),
        ..Default::default()
    });
    let analysis = engine(chain).analyze_wash_trading(MINT).await;

    assert!(analysis.self_trades.is_empty());
    assert!(analysis.circular_patterns.is_empty());
    assert!(analysis.interval_anomaly.as_ref().unwrap().regularity_score <= 60);
    assert!(analysis.volume_anomaly.as_ref().unwrap().anomaly_score <= 30);
    assert_eq!(analysis.wash_score, 0);
    assert_eq!(analysis.risk_level, WashRiskLevel::Minimal);
    assert_eq!(analysis.unique_traders, 15);
}

#[tokio::test]
async fn test_rotated_cycles_collapse_to_one_pattern() {
    let swaps = vec![
        transfer("t1", 10, 0, "alice", "bob", 5_000.0),
        transfer("t2", 11, MINUTE, "bob", "carol", 5_000.0),
        transfer("t3", 12, 2 * MINUTE, "carol", "alice", 5_000.0),
        transfer("t4", 13, 3 * MINUTE, "bob", "carol", 4_000.0),
        transfer("t5", 14, 4 * MINUTE, "carol", "alice", 4_000.0),
        transfer("t6", 15, 5 * MINUTE, "alice", "bob", 4_000.0),
    ];

    let chain = Arc::new(MockChain {
        swaps,
        market: Some(quiet_market()),
        ..Default::default()
    });
    let analysis = engine(chain).analyze_wash_trading(MINT).await;

    assert_eq!(analysis.circular_patterns.len(), 1);
    let pattern = &analysis.circular_patterns[0];
    assert_eq!(pattern.wallets.len(), 3);
    assert!(pattern.wallets.len() <= 4);
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.code == warning_codes::CIRCULAR_TRADING));
}

#[tokio::test]
async fn test_estimated_real_volume_never_negative() {
    let mut swaps = Vec::new();
    for i in 0..12 {
        let t = i as i64 * MINUTE;
        swaps.push(buy(&format!("b{}", i), 100 + i * 2, t, "whale", 1e15));
        swaps.push(sell(&format!("s{}", i), 101 + i * 2, t + 1_000, "whale", 1e15));
    }

    let mut market = quiet_market();
    market.volume_24h = 10.0;
    market.price_usd = Some(1_000.0);

    let chain = Arc::new(MockChain {
        swaps,
        market: Some(market),
        ..Default::default()
    });
    let analysis = engine(chain).analyze_wash_trading(MINT).await;

    assert!(analysis.estimated_real_volume >= 0.0);
    assert!(analysis.wash_score <= 100);
}

#[tokio::test]
async fn test_market_stats_outage_skips_volume_detector() {
    let swaps = vec![buy("b0", 1, 0, "holder", 10.0)];
    let chain = Arc::new(MockChain {
        swaps,
        market: None,
        ..Default::default()
    });
    let analysis = engine(chain.clone()).analyze_wash_trading(MINT).await;

    assert!(analysis.volume_anomaly.is_none());
    assert_eq!(analysis.transactions_analyzed, 1);
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.code == warning_codes::UPSTREAM_UNAVAILABLE));
    assert_eq!(chain.market_calls(), 1);
}

#[tokio::test]
async fn test_unknown_token_is_minimal_with_warning() {
    let chain = Arc::new(MockChain {
        market: Some(quiet_market()),
        ..Default::default()
    });
    let analysis = engine(chain).analyze_wash_trading(MINT).await;

    assert_eq!(analysis.wash_score, 0);
    assert_eq!(analysis.risk_level, WashRiskLevel::Minimal);
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.code == warning_codes::INSUFFICIENT_DATA));
}
