//! Background refresh daemon: wires the Polygon client, recommendation
//! cache and round-robin scheduler together and runs until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use polygon_client::PolygonClient;
use recommend_core::{universe, ScoreWeights};
use recommend_service::{CacheConfig, RecommendationCache, RefreshScheduler, SchedulerConfig, TickOutcome};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_key = std::env::var("POLYGON_API_KEY").context("POLYGON_API_KEY must be set")?;
    let interval_secs: u64 = env_or("RADAR_REFRESH_INTERVAL_SECS", 60);
    let max_calls_per_minute: u32 = env_or("RADAR_MAX_CALLS_PER_MINUTE", 5);
    let ttl_secs: i64 = env_or("RADAR_CACHE_TTL_SECS", 60);

    let symbols = universe::full_universe();
    tracing::info!(
        "Tracking {} symbols | refresh every {}s | budget {} calls/min | cache TTL {}s",
        symbols.len(),
        interval_secs,
        max_calls_per_minute,
        ttl_secs
    );

    let provider = Arc::new(PolygonClient::new(api_key));
    let cache = Arc::new(RecommendationCache::new(
        provider,
        ScoreWeights::default(),
        CacheConfig {
            ttl_secs,
            ..CacheConfig::default()
        },
    ));
    let scheduler = Arc::new(RefreshScheduler::new(
        cache,
        symbols,
        SchedulerConfig {
            max_calls_per_minute,
            ..SchedulerConfig::default()
        },
    ));

    scheduler
        .start(interval_secs, |outcome| {
            if let TickOutcome::Error { detail } = outcome {
                tracing::warn!("Refresh cycle error: {}", detail);
            }
        })
        .await;

    tracing::info!("Refresh loop running. Press Ctrl+C to stop.");

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
    }

    scheduler.stop().await;
    tracing::info!("Scheduler stopped, exiting");
    Ok(())
}
