use crate::cache::RecommendationCache;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Length of the call-budget window
const WINDOW_SECS: i64 = 60;

/// Outcome of one scheduler tick, matched exhaustively by observers
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Success { symbol: String },
    RateLimited { retry_at: DateTime<Utc> },
    Error { detail: String },
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upstream free-tier budget; refreshes beyond this within one window
    /// are skipped, not queued
    pub max_calls_per_minute: u32,
    /// Delay before the immediate first tick after `start`
    pub first_tick_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_calls_per_minute: 5,
            first_tick_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub active: bool,
    pub calls_in_window: u32,
    pub window_reset_at: DateTime<Utc>,
}

struct SchedulerState {
    cycle_index: usize,
    calls_in_window: u32,
    window_started_at: DateTime<Utc>,
}

/// Periodic round-robin refresher. One symbol per tick keeps the
/// aggregate call rate under the upstream budget even under manual
/// refresh spam, while still cycling the whole universe over a bounded
/// number of ticks.
///
/// All mutation of the cycle index and call counters goes through
/// `tick`, and the timer task awaits each tick body to completion, so
/// ticks never overlap.
pub struct RefreshScheduler {
    cache: Arc<RecommendationCache>,
    universe: Vec<String>,
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        cache: Arc<RecommendationCache>,
        universe: Vec<String>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            cache,
            universe,
            config,
            state: Mutex::new(SchedulerState {
                cycle_index: 0,
                calls_in_window: 0,
                window_started_at: Utc::now(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Run one refresh step: budget check, round-robin pick, fetch and
    /// cache. When the budget is exhausted the cycle pointer does not
    /// advance and nothing is fetched.
    pub async fn tick(&self) -> TickOutcome {
        if self.universe.is_empty() {
            return TickOutcome::Error {
                detail: "tracked universe is empty".to_string(),
            };
        }

        let symbol = {
            let mut state = self.state.lock().await;
            let now = Utc::now();
            if now - state.window_started_at >= Duration::seconds(WINDOW_SECS) {
                state.window_started_at = now;
                state.calls_in_window = 0;
            }
            if state.calls_in_window >= self.config.max_calls_per_minute {
                return TickOutcome::RateLimited {
                    retry_at: state.window_started_at + Duration::seconds(WINDOW_SECS),
                };
            }
            state.calls_in_window += 1;
            let symbol = self.universe[state.cycle_index % self.universe.len()].clone();
            state.cycle_index = (state.cycle_index + 1) % self.universe.len();
            symbol
        };

        // get_or_compute absorbs provider failures, so reaching here
        // always yields a well-formed recommendation in the cache
        self.cache.get_or_compute(&symbol, true).await;
        TickOutcome::Success { symbol }
    }

    /// Start the periodic timer. Last call wins: an already-running timer
    /// is stopped first. The first tick fires after a short delay, then
    /// every `interval_secs`.
    pub async fn start<F>(self: &Arc<Self>, interval_secs: u64, on_tick: F)
    where
        F: Fn(&TickOutcome) + Send + Sync + 'static,
    {
        self.stop().await;

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(
                scheduler.config.first_tick_delay_ms,
            ))
            .await;
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let outcome = scheduler.tick().await;
                match &outcome {
                    TickOutcome::Success { symbol } => {
                        tracing::info!("Refreshed recommendation for {}", symbol);
                    }
                    TickOutcome::RateLimited { retry_at } => {
                        tracing::debug!("Call budget exhausted, next window at {}", retry_at);
                    }
                    TickOutcome::Error { detail } => {
                        tracing::error!("Refresh tick failed: {}", detail);
                    }
                }
                on_tick(&outcome);
            }
        });
        *self.handle.lock().await = Some(handle);
    }

    /// Cancel the timer. No tick fires after this returns; the scheduler
    /// goes back to idle and can be started again.
    pub async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
    }

    /// Execute a tick on the caller's task instead of waiting for the
    /// timer. Honors the call budget: when exhausted this returns
    /// `RateLimited` immediately with no side effects.
    pub async fn force_refresh(&self) -> TickOutcome {
        self.tick().await
    }

    pub async fn status(&self) -> SchedulerStatus {
        let active = self
            .handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished());
        let state = self.state.lock().await;
        SchedulerStatus {
            active,
            calls_in_window: state.calls_in_window,
            window_reset_at: state.window_started_at + Duration::seconds(WINDOW_SECS),
        }
    }
}
