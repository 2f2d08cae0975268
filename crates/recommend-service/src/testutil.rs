//! Shared test doubles for cache and scheduler tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use recommend_core::{
    Bar, IndicatorPoint, InsiderTransaction, MarketDataProvider, RadarError, TickerMeta,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Daily bars with a constant per-bar percent drift, newest last
pub(crate) fn drifting_bars(count: usize, start_close: f64, drift_pct: f64) -> Vec<Bar> {
    let mut close = start_close;
    (0..count)
        .map(|i| {
            let bar = Bar {
                timestamp: Utc::now() - Duration::days((count - i) as i64),
                open: close * 0.998,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000.0,
            };
            close *= 1.0 + drift_pct / 100.0;
            bar
        })
        .collect()
}

/// Provider double serving fixed data, with per-symbol and global failure
/// switches plus a call counter for no-redundant-fetch assertions.
pub(crate) struct MockProvider {
    bars: Vec<Bar>,
    transactions: Vec<InsiderTransaction>,
    pub fail_all: AtomicBool,
    fail_symbols: Mutex<Vec<String>>,
    pub bar_calls: AtomicUsize,
}

impl MockProvider {
    pub fn with_bars(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            transactions: Vec::new(),
            fail_all: AtomicBool::new(false),
            fail_symbols: Mutex::new(Vec::new()),
            bar_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_symbol(&self, symbol: &str) {
        self.fail_symbols
            .lock()
            .expect("fail_symbols lock")
            .push(symbol.to_uppercase());
    }

    fn should_fail(&self, symbol: &str) -> bool {
        self.fail_all.load(Ordering::SeqCst)
            || self
                .fail_symbols
                .lock()
                .expect("fail_symbols lock")
                .contains(&symbol.to_uppercase())
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn get_price_bars(&self, symbol: &str, _days_back: i64) -> Result<Vec<Bar>, RadarError> {
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(symbol) {
            return Err(RadarError::Provider("mock outage".to_string()));
        }
        Ok(self.bars.clone())
    }

    async fn get_ticker_meta(&self, symbol: &str) -> Result<Option<TickerMeta>, RadarError> {
        if self.should_fail(symbol) {
            return Err(RadarError::Provider("mock outage".to_string()));
        }
        Ok(None)
    }

    async fn get_insider_transactions(
        &self,
        symbol: &str,
        _limit: u32,
    ) -> Result<Vec<InsiderTransaction>, RadarError> {
        if self.should_fail(symbol) {
            return Err(RadarError::Provider("mock outage".to_string()));
        }
        Ok(self.transactions.clone())
    }

    async fn get_indicator_series(
        &self,
        symbol: &str,
        _window: u32,
    ) -> Result<Option<Vec<IndicatorPoint>>, RadarError> {
        if self.should_fail(symbol) {
            return Err(RadarError::Provider("mock outage".to_string()));
        }
        Ok(None)
    }
}
