use crate::pipeline;
use analysis_engine::compose_recommendation;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;
use recommend_core::{MarketDataProvider, Recommendation, ScoreWeights};
use std::sync::{Arc, RwLock};

/// Cache tuning. The TTL matches the scheduler interval so a full
/// round-robin cycle keeps entries warm.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_secs: i64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            batch_size: 3,
            batch_delay_ms: 1000,
        }
    }
}

struct CacheEntry {
    recommendation: Recommendation,
    computed_at: DateTime<Utc>,
}

/// Process-lifetime store of `symbol -> recommendation`, keyed by
/// uppercased symbol. Entries are overwritten on refresh and never
/// deleted; staleness is an age check at read time.
pub struct RecommendationCache {
    provider: Arc<dyn MarketDataProvider>,
    entries: DashMap<String, CacheEntry>,
    weights: ScoreWeights,
    config: CacheConfig,
    last_global_refresh: RwLock<Option<DateTime<Utc>>>,
}

impl RecommendationCache {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        weights: ScoreWeights,
        config: CacheConfig,
    ) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
            weights,
            config,
            last_global_refresh: RwLock::new(None),
        }
    }

    fn is_fresh(&self, computed_at: DateTime<Utc>) -> bool {
        (Utc::now() - computed_at).num_seconds() < self.config.ttl_secs
    }

    /// Return the cached recommendation regardless of age. Used for
    /// graceful degradation when the upstream is unreachable.
    pub fn get(&self, symbol: &str) -> Option<Recommendation> {
        self.entries
            .get(&symbol.to_uppercase())
            .map(|e| e.recommendation.clone())
    }

    pub fn put(&self, symbol: &str, recommendation: Recommendation) {
        self.entries.insert(
            symbol.to_uppercase(),
            CacheEntry {
                recommendation,
                computed_at: Utc::now(),
            },
        );
    }

    /// Timestamp of the last successful fetch+analyze across all symbols,
    /// used for cache-wide staleness bookkeeping of batch reads
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_global_refresh.read().ok().and_then(|g| *g)
    }

    /// Serve from cache when fresh, otherwise fetch, analyze and store.
    /// The fallback policy is uniform: try the provider; on total failure,
    /// serve the last cached value; with nothing cached, a neutral
    /// recommendation. Callers never see an error.
    pub async fn get_or_compute(&self, symbol: &str, force_refresh: bool) -> Recommendation {
        let key = symbol.to_uppercase();

        if !force_refresh {
            if let Some(entry) = self.entries.get(&key) {
                if self.is_fresh(entry.computed_at) {
                    return entry.recommendation.clone();
                }
            }
        }

        let bundle = pipeline::fetch_bundle(self.provider.as_ref(), &key).await;
        if bundle.is_empty() {
            if let Some(entry) = self.entries.get(&key) {
                tracing::warn!(
                    "All fetches failed for {}, serving last cached recommendation",
                    key
                );
                return entry.recommendation.clone();
            }
            tracing::warn!("All fetches failed for {} with no cached fallback", key);
            return Recommendation::neutral(&key);
        }

        let recommendation = compose_recommendation(
            &key,
            &bundle.bars,
            bundle.meta.as_ref(),
            &bundle.transactions,
            bundle.indicator_series.as_deref(),
            &self.weights,
        );
        self.put(&key, recommendation.clone());
        if let Ok(mut last) = self.last_global_refresh.write() {
            *last = Some(Utc::now());
        }
        tracing::debug!(
            "Recomputed {}: score {} ({:?})",
            key,
            recommendation.score,
            recommendation.label
        );
        recommendation
    }

    /// Read-through lookup for a list of symbols, preserving input order
    pub async fn get_many(&self, symbols: &[String]) -> Vec<Recommendation> {
        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            results.push(self.get_or_compute(symbol, false).await);
        }
        results
    }

    /// Force-refresh many symbols in fixed-size batches with an
    /// inter-batch delay, to stay polite toward the upstream rate limit.
    /// Per-symbol failures degrade to neutral instead of aborting the
    /// batch.
    pub async fn refresh_many(&self, symbols: &[String]) -> Vec<Recommendation> {
        let mut results = Vec::with_capacity(symbols.len());
        let mut batches = symbols.chunks(self.config.batch_size.max(1)).peekable();
        while let Some(batch) = batches.next() {
            let refreshed =
                join_all(batch.iter().map(|s| self.get_or_compute(s, true))).await;
            results.extend(refreshed);
            if batches.peek().is_some() && self.config.batch_delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.config.batch_delay_ms))
                    .await;
            }
        }
        results
    }

    /// Highest-scored cached recommendations, preferring buy-labeled
    /// entries and falling back to the best of the rest when fewer than
    /// `limit` qualify.
    pub fn top_recommendations<F>(&self, limit: usize, filter: F) -> Vec<Recommendation>
    where
        F: Fn(&Recommendation) -> bool,
    {
        let mut all: Vec<Recommendation> = self
            .entries
            .iter()
            .map(|e| e.recommendation.clone())
            .filter(|r| filter(r))
            .collect();
        all.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.symbol.cmp(&b.symbol)));

        let (buys, rest): (Vec<_>, Vec<_>) = all.into_iter().partition(|r| r.label.is_buy());
        buys.into_iter().chain(rest).take(limit).collect()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, symbol: &str, secs: i64) {
        if let Some(mut entry) = self.entries.get_mut(&symbol.to_uppercase()) {
            entry.computed_at -= chrono::Duration::seconds(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{drifting_bars, MockProvider};
    use recommend_core::RecommendationLabel;
    use std::sync::atomic::Ordering;

    fn cache_with(provider: Arc<MockProvider>) -> RecommendationCache {
        let config = CacheConfig {
            ttl_secs: 60,
            batch_size: 3,
            batch_delay_ms: 0,
        };
        RecommendationCache::new(provider, ScoreWeights::default(), config)
    }

    #[tokio::test]
    async fn fresh_hit_skips_the_provider() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock.clone());

        let first = cache.get_or_compute("AAPL", false).await;
        let second = cache.get_or_compute("aapl", false).await;

        assert_eq!(first, second);
        assert_eq!(mock.bar_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entry_triggers_recompute() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock.clone());

        cache.get_or_compute("MSFT", false).await;
        cache.backdate("MSFT", 61);
        cache.get_or_compute("MSFT", false).await;

        assert_eq!(mock.bar_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_a_fresh_entry() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock.clone());

        cache.get_or_compute("NVDA", false).await;
        cache.get_or_compute("NVDA", true).await;

        assert_eq!(mock.bar_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn get_returns_stale_entries() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock);

        let computed = cache.get_or_compute("AMZN", false).await;
        cache.backdate("AMZN", 3600);
        assert_eq!(cache.get("AMZN"), Some(computed));
    }

    #[tokio::test]
    async fn total_outage_serves_last_known_good() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock.clone());

        let good = cache.get_or_compute("META", false).await;
        mock.fail_all.store(true, Ordering::SeqCst);

        let degraded = cache.get_or_compute("META", true).await;
        assert_eq!(degraded, good);
    }

    #[tokio::test]
    async fn total_outage_without_cache_is_neutral() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        mock.fail_all.store(true, Ordering::SeqCst);
        let cache = cache_with(mock);

        let rec = cache.get_or_compute("TSLA", false).await;
        assert_eq!(rec.score, 50);
        assert_eq!(rec.label, RecommendationLabel::Neutral);
    }

    #[tokio::test]
    async fn last_global_refresh_tracks_successful_computes() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock);

        assert!(cache.last_refreshed().is_none());
        cache.get_or_compute("AAPL", false).await;
        assert!(cache.last_refreshed().is_some());
    }

    #[tokio::test]
    async fn refresh_many_degrades_failed_symbols_to_neutral() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        mock.fail_symbol("BAD");
        let cache = cache_with(mock);

        let symbols: Vec<String> = ["AAPL", "BAD", "MSFT", "GOOGL"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let recs = cache.refresh_many(&symbols).await;

        assert_eq!(recs.len(), 4);
        assert_eq!(recs[1].label, RecommendationLabel::Neutral);
        assert_ne!(recs[0].label, RecommendationLabel::Neutral);
    }

    #[tokio::test]
    async fn get_many_preserves_input_order() {
        let mock = Arc::new(MockProvider::with_bars(drifting_bars(30, 100.0, 0.3)));
        let cache = cache_with(mock);

        let symbols: Vec<String> = ["MSFT", "AAPL"].iter().map(|s| s.to_string()).collect();
        let recs = cache.get_many(&symbols).await;
        assert_eq!(recs[0].symbol, "MSFT");
        assert_eq!(recs[1].symbol, "AAPL");
    }

    #[tokio::test]
    async fn top_recommendations_prefers_buy_labels() {
        let mock = Arc::new(MockProvider::with_bars(Vec::new()));
        let cache = cache_with(mock);

        let mut hold = Recommendation::neutral("HOLD1");
        hold.score = 90;
        hold.label = RecommendationLabel::Hold;
        let mut buy_low = Recommendation::neutral("BUY1");
        buy_low.score = 66;
        buy_low.label = RecommendationLabel::Buy;
        let mut buy_high = Recommendation::neutral("BUY2");
        buy_high.score = 78;
        buy_high.label = RecommendationLabel::StrongBuy;

        cache.put("HOLD1", hold);
        cache.put("BUY1", buy_low);
        cache.put("BUY2", buy_high);

        let top = cache.top_recommendations(2, |_| true);
        assert_eq!(top[0].symbol, "BUY2");
        assert_eq!(top[1].symbol, "BUY1");
    }

    #[tokio::test]
    async fn top_recommendations_falls_back_when_no_buys_qualify() {
        let mock = Arc::new(MockProvider::with_bars(Vec::new()));
        let cache = cache_with(mock);

        let mut a = Recommendation::neutral("AAA");
        a.score = 55;
        a.label = RecommendationLabel::Hold;
        let mut b = Recommendation::neutral("BBB");
        b.score = 40;
        b.label = RecommendationLabel::Sell;
        cache.put("AAA", a);
        cache.put("BBB", b);

        let top = cache.top_recommendations(1, |_| true);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].symbol, "AAA");
    }

    #[tokio::test]
    async fn top_recommendations_applies_the_filter() {
        let mock = Arc::new(MockProvider::with_bars(Vec::new()));
        let cache = cache_with(mock);

        let mut a = Recommendation::neutral("AAA");
        a.score = 80;
        a.label = RecommendationLabel::StrongBuy;
        let mut b = Recommendation::neutral("BBB");
        b.score = 70;
        b.label = RecommendationLabel::Buy;
        cache.put("AAA", a);
        cache.put("BBB", b);

        let top = cache.top_recommendations(5, |r| r.symbol != "AAA");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].symbol, "BBB");
    }
}
