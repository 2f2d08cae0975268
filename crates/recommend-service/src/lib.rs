//! Shared recommendation cache, fetch-with-fallback pipeline and the
//! rate-limited round-robin refresh scheduler.

pub mod cache;
pub mod pipeline;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testutil;

pub use cache::{CacheConfig, RecommendationCache};
pub use pipeline::MarketBundle;
pub use scheduler::{RefreshScheduler, SchedulerConfig, SchedulerStatus, TickOutcome};
