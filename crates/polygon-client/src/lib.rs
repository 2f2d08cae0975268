//! Polygon.io REST client covering the four endpoints the recommendation
//! pipeline consumes: daily aggregates, ticker details, insider
//! transactions and the SMA indicator series.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use recommend_core::{
    Bar, IndicatorPoint, InsiderTransaction, MarketDataProvider, RadarError, TickerMeta,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://api.polygon.io";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let wait_until = match ts.front().and_then(|f| f.checked_add(self.window)) {
                Some(t) => t,
                None => now + self.window,
            };
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Polygon API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        // Free tier allows 5 calls per minute; paid plans can raise this
        // via POLYGON_RATE_LIMIT.
        let rate_limit: usize = std::env::var("POLYGON_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RadarError> {
        let request = builder
            .build()
            .map_err(|e| RadarError::Provider(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| RadarError::Provider("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| RadarError::Provider(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!(
                "Polygon 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(RadarError::Provider(
            "Rate limited by Polygon after 3 retries".to_string(),
        ))
    }

    /// Get daily aggregates (bars) for the trailing `days_back` days
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        days_back: i64,
    ) -> Result<Vec<Bar>, RadarError> {
        let to = Utc::now();
        let from = to - ChronoDuration::days(days_back);
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            BASE_URL,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(RadarError::Provider(format!(
                "Aggregates HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Provider(e.to_string()))?;

        Ok(agg_response
            .results
            .into_iter()
            .map(|r| Bar {
                timestamp: DateTime::from_timestamp_millis(r.t).unwrap_or_else(Utc::now),
                open: r.o,
                high: r.h,
                low: r.l,
                close: r.c,
                volume: r.v,
            })
            .collect())
    }

    /// Get ticker details. Unknown symbols map to `None`.
    pub async fn get_ticker_details(
        &self,
        symbol: &str,
    ) -> Result<Option<TickerMeta>, RadarError> {
        let url = format!("{}/v3/reference/tickers/{}", BASE_URL, symbol);

        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .query(&[("apiKey", self.api_key.as_str())]),
            )
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RadarError::Provider(format!(
                "Ticker details HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let details: TickerDetailsResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Provider(e.to_string()))?;

        let exchange = match details.results.primary_exchange {
            Some(ex) if !ex.is_empty() => ex,
            _ => "Unknown".to_string(),
        };

        Ok(Some(TickerMeta {
            symbol: details.results.ticker,
            name: details.results.name,
            exchange,
        }))
    }

    /// Get insider transactions. The endpoint is plan-gated, so 401/403/404
    /// degrade to an empty list rather than an error.
    pub async fn get_insider_transactions(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<InsiderTransaction>, RadarError> {
        let url = format!("{}/vX/reference/insiders", BASE_URL);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("apiKey", self.api_key.as_str()),
                ("limit", &limit.to_string()),
            ]))
            .await?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 || status == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(RadarError::Provider(format!(
                "Insiders HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let insider_response: InsiderResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Provider(e.to_string()))?;

        Ok(insider_response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| InsiderTransaction {
                name: r.name,
                title: r.title,
                filing_date: r.filing_date.as_deref().and_then(parse_filing_date),
                transaction_type: r.transaction_type,
                shares: r.shares,
            })
            .collect())
    }

    /// Get the SMA indicator series from Polygon's technical indicators
    /// API. Enhancement input only: any failure degrades to `None`.
    pub async fn get_sma(
        &self,
        symbol: &str,
        window: u32,
    ) -> Result<Option<Vec<IndicatorPoint>>, RadarError> {
        let url = format!("{}/v1/indicators/sma/{}", BASE_URL, symbol);

        let response = match self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("window", &window.to_string()),
                ("timespan", "day"),
                ("limit", "1"),
                ("series_type", "close"),
            ]))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("SMA indicator fetch failed for {}: {}", symbol, e);
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                "SMA indicator HTTP {} for {}, skipping override",
                response.status(),
                symbol
            );
            return Ok(None);
        }

        let ind_response: IndicatorResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("SMA indicator parse failed for {}: {}", symbol, e);
                return Ok(None);
            }
        };

        Ok(ind_response.results.and_then(|r| r.values))
    }
}

#[async_trait]
impl MarketDataProvider for PolygonClient {
    async fn get_price_bars(&self, symbol: &str, days_back: i64) -> Result<Vec<Bar>, RadarError> {
        self.get_aggregates(symbol, days_back).await
    }

    async fn get_ticker_meta(&self, symbol: &str) -> Result<Option<TickerMeta>, RadarError> {
        self.get_ticker_details(symbol).await
    }

    async fn get_insider_transactions(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<InsiderTransaction>, RadarError> {
        PolygonClient::get_insider_transactions(self, symbol, limit).await
    }

    async fn get_indicator_series(
        &self,
        symbol: &str,
        window: u32,
    ) -> Result<Option<Vec<IndicatorPoint>>, RadarError> {
        self.get_sma(symbol, window).await
    }
}

fn parse_filing_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// Aggregate types
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggBar>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

// Ticker details types
#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetailsRaw,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsRaw {
    ticker: String,
    name: String,
    #[serde(default)]
    primary_exchange: Option<String>,
}

// Insider types
#[derive(Debug, Deserialize)]
struct InsiderResponse {
    results: Option<Vec<InsiderTransactionRaw>>,
}

#[derive(Debug, Deserialize)]
struct InsiderTransactionRaw {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    filing_date: Option<String>,
    transaction_type: Option<String>,
    #[serde(default)]
    shares: Option<f64>,
}

// Indicator types
#[derive(Debug, Deserialize)]
struct IndicatorResponse {
    results: Option<IndicatorResults>,
}

#[derive(Debug, Deserialize)]
struct IndicatorResults {
    values: Option<Vec<IndicatorPoint>>,
}
