//! Observability module - structured logging and Prometheus metrics
//!
//! # Features
//! - `tracing` subscriber with `RUST_LOG` filtering and a fmt layer
//! - Per-engine Prometheus registry: analyses computed, cache hits/misses,
//!   upstream failures and analysis latency
//! - Text exposition via [`EngineMetrics::gather`]
//!
//! # Usage
//! ```no_run
//! use launch_risk_oracle::observability::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default()).expect("Failed to initialize logging");
//! ```

use anyhow::{Context, Result};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
    /// Include source file and line in each record
    pub with_file_and_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_file_and_line: true,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(config.with_file_and_line)
        .with_line_number(config.with_file_and_line);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(level = %config.level, "Logging initialized");
    Ok(())
}

/// Prometheus metrics owned by one engine instance
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    analyses: IntCounterVec,
    cache_lookups: IntCounterVec,
    upstream_failures: IntCounterVec,
    analysis_latency: HistogramVec,
}

impl EngineMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let analyses = IntCounterVec::new(
            Opts::new("launch_risk_analyses_total", "Analyses computed, by kind"),
            &["kind"],
        )?;
        let cache_lookups = IntCounterVec::new(
            Opts::new("launch_risk_cache_lookups_total", "Cache lookups, by cache and outcome"),
            &["cache", "outcome"],
        )?;
        let upstream_failures = IntCounterVec::new(
            Opts::new("launch_risk_upstream_failures_total", "Failed provider calls, by call"),
            &["call"],
        )?;
        let analysis_latency = HistogramVec::new(
            HistogramOpts::new("launch_risk_analysis_seconds", "Wall time of fresh analyses")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["kind"],
        )?;

        registry.register(Box::new(analyses.clone()))?;
        registry.register(Box::new(cache_lookups.clone()))?;
        registry.register(Box::new(upstream_failures.clone()))?;
        registry.register(Box::new(analysis_latency.clone()))?;

        Ok(Self {
            registry,
            analyses,
            cache_lookups,
            upstream_failures,
            analysis_latency,
        })
    }

    pub fn record_analysis(&self, kind: &str, seconds: f64) {
        self.analyses.with_label_values(&[kind]).inc();
        self.analysis_latency.with_label_values(&[kind]).observe(seconds);
    }

    pub fn record_cache_lookup(&self, cache: &str, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[cache, outcome]).inc();
    }

    pub fn record_upstream_failure(&self, call: &str) {
        self.upstream_failures.with_label_values(&[call]).inc();
    }

    pub fn analyses_total(&self, kind: &str) -> u64 {
        self.analyses.with_label_values(&[kind]).get()
    }

    pub fn cache_lookups_total(&self, cache: &str, hit: bool) -> u64 {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[cache, outcome]).get()
    }

    pub fn upstream_failures_total(&self, call: &str) -> u64 {
        self.upstream_failures.with_label_values(&[call]).get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
