//! Integration tests for engine caching
//!
//! TTL memoization, single-flight and cache-only reads

mod common;

use common::{buy, engine, engine_with, quiet_market, sell, MockChain, MINT};
use futures::future::join_all;
use launch_risk_oracle::config::EngineConfig;
use launch_risk_oracle::oracle::TokenLaunchInfo;
use std::sync::Arc;
use std::time::Duration;

fn busy_chain() -> MockChain {
    let mut swaps = Vec::new();
    for i in 0..6u64 {
        let wallet = format!("trader{}", i);
        let t = i as i64 * 120_000;
        swaps.push(buy(&format!("b{}", i), 900 + i, t, &wallet, 2_500.0));
        swaps.push(sell(&format!("s{}", i), 901 + i, t + 30_000, &wallet, 2_400.0));
    }

    MockChain {
        swaps,
        market: Some(quiet_market()),
        launch: Some(TokenLaunchInfo {
            creation_slot: 900,
            creation_time_ms: None,
            total_supply: 1_000_000.0,
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_second_call_is_cached_and_identical() {
    let chain = Arc::new(busy_chain());
    let engine = engine(chain.clone());

    let first = engine.analyze_wash_trading(MINT).await;
    let second = engine.analyze_wash_trading(MINT).await;

    assert!(!first.cached);
    assert!(second.cached);

    let mut uncached_view = second.clone();
    uncached_view.cached = false;
    assert_eq!(first, uncached_view);

    assert_eq!(chain.swap_calls(), 1);
    assert_eq!(chain.market_calls(), 1);

    let stats = engine.cache_stats().await;
    assert_eq!(stats.wash.hits, 1);
    assert_eq!(stats.wash.misses, 1);
    assert_eq!(engine.metrics().analyses_total("wash"), 1);
}

#[tokio::test]
async fn test_unlisted_token_verdict_is_cached() {
    // Fresh launch with no DEX pair yet
    let chain = Arc::new(MockChain {
        market: None,
        ..busy_chain()
    });
    let engine = engine(chain.clone());

    let first = engine.analyze_wash_trading(MINT).await;
    let second = engine.analyze_wash_trading(MINT).await;

    assert!(first.volume_anomaly.is_none());
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(chain.swap_calls(), 1);
    assert_eq!(chain.market_calls(), 1);
    assert_eq!(engine.get_quick_wash_score(MINT).await, Some(first.wash_score));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_fetch() {
    let chain = Arc::new(MockChain {
        latency: Duration::from_millis(50),
        ..busy_chain()
    });
    let engine = engine(chain.clone());

    let results = join_all((0..8).map(|_| engine.analyze_wash_trading(MINT))).await;

    assert_eq!(chain.swap_calls(), 1);
    assert_eq!(results.iter().filter(|a| !a.cached).count(), 1);
    let score = results[0].wash_score;
    assert!(results.iter().all(|a| a.wash_score == score));
}

#[tokio::test]
async fn test_quick_reads_only_see_cache() {
    let chain = Arc::new(busy_chain());
    let engine = engine(chain.clone());

    assert!(engine.get_quick_wash_score(MINT).await.is_none());
    assert!(engine.get_quick_sniper_analysis(MINT).await.is_none());
    assert_eq!(chain.swap_calls(), 0);

    let wash = engine.analyze_wash_trading(MINT).await;
    let snipers = engine.analyze_snipers(MINT).await;

    assert_eq!(engine.get_quick_wash_score(MINT).await, Some(wash.wash_score));
    let quick = engine.get_quick_sniper_analysis(MINT).await.unwrap();
    assert!(quick.cached);
    assert_eq!(quick.sniper_score, snipers.sniper_score);
    assert_eq!(chain.swap_calls(), 2);
}

#[tokio::test]
async fn test_invalidate_token_forces_refetch() {
    let chain = Arc::new(busy_chain());
    let engine = engine(chain.clone());

    engine.analyze_wash_trading(MINT).await;
    engine.analyze_snipers(MINT).await;
    engine.invalidate_token(MINT).await;

    assert!(engine.get_quick_wash_score(MINT).await.is_none());
    let wash = engine.analyze_wash_trading(MINT).await;
    let snipers = engine.analyze_snipers(MINT).await;

    assert!(!wash.cached);
    assert!(!snipers.cached);
    assert_eq!(chain.launch_calls(), 2);
}

#[tokio::test]
async fn test_token_ttl_expiry() {
    let chain = Arc::new(busy_chain());
    let mut config = EngineConfig::default();
    config.cache.token_ttl_secs = 1;
    let engine = engine_with(chain.clone(), config);

    engine.analyze_wash_trading(MINT).await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let again = engine.analyze_wash_trading(MINT).await;

    assert!(!again.cached);
    assert_eq!(chain.swap_calls(), 2);
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let chain = Arc::new(busy_chain());
    let engine = engine(chain);

    let mints: Vec<String> = vec![MINT.to_string(), "OtherMint".to_string(), MINT.to_string()];
    let results = engine.analyze_wash_trading_batch(&mints, 2).await;

    let order: Vec<&str> = results.iter().map(|a| a.token_mint.as_str()).collect();
    assert_eq!(order, vec![MINT, "OtherMint", MINT]);
    // Every swap in the mock belongs to MINT
    assert_eq!(results[1].transactions_analyzed, 0);

    let snipers = engine.analyze_snipers_batch(&mints, 2).await;
    assert_eq!(snipers.len(), 3);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let chain = Arc::new(busy_chain());
    let engine = engine(chain);

    engine.analyze_wash_trading(MINT).await;
    engine.analyze_wash_trading(MINT).await;

    let text = engine.metrics().gather();
    assert!(text.contains("launch_risk_cache_lookups_total"));
    assert!(text.contains("outcome=\"hit\""));
    assert_eq!(engine.metrics().cache_lookups_total("wash", true), 1);
}
