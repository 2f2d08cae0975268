use recommend_core::{
    universe, Bar, IndicatorPoint, InsiderTransaction, MarketDataProvider, TickerMeta,
};

/// Calendar days of history to request; covers the 30 trading bars the
/// long-term trend window needs
pub const BAR_HISTORY_DAYS: i64 = 60;

/// How many insider filings to request per symbol
const INSIDER_FETCH_LIMIT: u32 = 50;

/// SMA window requested from the provider's indicator endpoint
const INDICATOR_SMA_WINDOW: u32 = 20;

/// Best-effort bundle of everything the analysis engine consumes for one
/// symbol. Any subset of fields may be populated.
#[derive(Debug, Default)]
pub struct MarketBundle {
    pub bars: Vec<Bar>,
    pub meta: Option<TickerMeta>,
    pub transactions: Vec<InsiderTransaction>,
    pub indicator_series: Option<Vec<IndicatorPoint>>,
}

impl MarketBundle {
    /// True when every upstream fetch came back empty
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
            && self.meta.is_none()
            && self.transactions.is_empty()
            && self.indicator_series.is_none()
    }
}

/// Fetch all inputs for one symbol with per-request fault isolation: a
/// failure in one request never fails the others. Insider filings are
/// skipped for fund symbols, which structurally have none.
pub async fn fetch_bundle(provider: &dyn MarketDataProvider, symbol: &str) -> MarketBundle {
    let fetch_insiders = !universe::is_fund(symbol);

    let (bars, meta, transactions, indicator_series) = tokio::join!(
        provider.get_price_bars(symbol, BAR_HISTORY_DAYS),
        provider.get_ticker_meta(symbol),
        async {
            if fetch_insiders {
                provider
                    .get_insider_transactions(symbol, INSIDER_FETCH_LIMIT)
                    .await
            } else {
                Ok(Vec::new())
            }
        },
        provider.get_indicator_series(symbol, INDICATOR_SMA_WINDOW),
    );

    let bars = bars.unwrap_or_else(|e| {
        tracing::warn!("Price bars fetch failed for {}: {}", symbol, e);
        Vec::new()
    });
    let meta = meta.unwrap_or_else(|e| {
        tracing::warn!("Ticker metadata fetch failed for {}: {}", symbol, e);
        None
    });
    let transactions = transactions.unwrap_or_else(|e| {
        tracing::warn!("Insider transactions fetch failed for {}: {}", symbol, e);
        Vec::new()
    });
    let indicator_series = indicator_series.unwrap_or_else(|e| {
        tracing::debug!("Indicator series fetch failed for {}: {}", symbol, e);
        None
    });

    MarketBundle {
        bars,
        meta,
        transactions,
        indicator_series,
    }
}
