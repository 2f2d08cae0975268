use crate::{Bar, IndicatorPoint, InsiderTransaction, RadarError, TickerMeta};
use async_trait::async_trait;

/// Upstream market-data capability. Every call is independently fallible;
/// the fetch pipeline is responsible for absorbing failures.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily OHLCV bars covering the trailing `days_back` calendar days,
    /// ascending by timestamp.
    async fn get_price_bars(&self, symbol: &str, days_back: i64) -> Result<Vec<Bar>, RadarError>;

    /// Ticker name/exchange. `None` when the symbol is unknown upstream.
    async fn get_ticker_meta(&self, symbol: &str) -> Result<Option<TickerMeta>, RadarError>;

    /// Insider transaction filings. Expected empty for ETFs and indices.
    async fn get_insider_transactions(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<InsiderTransaction>, RadarError>;

    /// Precomputed SMA series for the given window. Optional enhancement
    /// input; `None` when the provider plan does not include it.
    async fn get_indicator_series(
        &self,
        symbol: &str,
        window: u32,
    ) -> Result<Option<Vec<IndicatorPoint>>, RadarError>;
}
