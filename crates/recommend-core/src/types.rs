use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ticker metadata from the reference endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMeta {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

/// A single insider transaction filing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTransaction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub filing_date: Option<DateTime<Utc>>,
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub shares: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Other,
}

impl InsiderTransaction {
    /// Classify the filing by its transaction type string.
    /// Purchases and acquisitions count as buys, sales and dispositions as sells.
    pub fn kind(&self) -> TransactionKind {
        let Some(kind) = self.transaction_type.as_deref() else {
            return TransactionKind::Other;
        };
        let kind = kind.to_lowercase();
        if kind.contains("purchase") || kind.contains("acquisition") || kind.contains("buy") {
            TransactionKind::Buy
        } else if kind.contains("sale") || kind.contains("disposition") || kind.contains("sell") {
            TransactionKind::Sell
        } else {
            TransactionKind::Other
        }
    }
}

/// One sample of a precomputed indicator series (e.g. SMA-20 from the provider)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
}

/// Authoritative label on the cached recommendation, a step function of the
/// composite score. `Neutral` is reserved for the fully-degraded no-data case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationLabel {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    Neutral,
}

impl RecommendationLabel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 75.0 => RecommendationLabel::StrongBuy,
            s if s >= 65.0 => RecommendationLabel::Buy,
            s if s <= 35.0 => RecommendationLabel::StrongSell,
            s if s <= 45.0 => RecommendationLabel::Sell,
            _ => RecommendationLabel::Hold,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, RecommendationLabel::StrongBuy | RecommendationLabel::Buy)
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            RecommendationLabel::StrongBuy => "Strong Buy",
            RecommendationLabel::Buy => "Buy",
            RecommendationLabel::Hold => "Hold",
            RecommendationLabel::Sell => "Sell",
            RecommendationLabel::StrongSell => "Strong Sell",
            RecommendationLabel::Neutral => "Neutral",
        }
    }
}

/// Informational sub-signal on the technical dimension only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnicalSignal {
    StrongBuy,
    Buy,
    Hold,
    WeakHold,
    Sell,
}

impl TechnicalSignal {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 70.0 => TechnicalSignal::StrongBuy,
            s if s >= 60.0 => TechnicalSignal::Buy,
            s if s <= 30.0 => TechnicalSignal::Sell,
            s if s <= 40.0 => TechnicalSignal::WeakHold,
            _ => TechnicalSignal::Hold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsiderSentiment {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

impl InsiderSentiment {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 70.0 => InsiderSentiment::VeryBullish,
            s if s >= 60.0 => InsiderSentiment::Bullish,
            s if s <= 30.0 => InsiderSentiment::VeryBearish,
            s if s <= 40.0 => InsiderSentiment::Bearish,
            _ => InsiderSentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTrend {
    StrongUptrend,
    Uptrend,
    Neutral,
    Downtrend,
    StrongDowntrend,
}

impl PriceTrend {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 70.0 => PriceTrend::StrongUptrend,
            s if s >= 60.0 => PriceTrend::Uptrend,
            s if s <= 30.0 => PriceTrend::StrongDowntrend,
            s if s <= 40.0 => PriceTrend::Downtrend,
            _ => PriceTrend::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

/// Percent change and direction over one trailing bar window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub direction: TrendDirection,
    pub percent_change: f64,
}

impl TrendWindow {
    pub fn neutral() -> Self {
        Self {
            direction: TrendDirection::Neutral,
            percent_change: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDetails {
    pub short_term: TrendWindow,
    pub intermediate: TrendWindow,
    pub long_term: TrendWindow,
    pub sma_5: Option<f64>,
    pub sma_10: Option<f64>,
    pub sma_20: Option<f64>,
    /// True when sma_20 came from the provider's indicator series
    /// rather than being computed locally
    pub sma_20_from_provider: bool,
}

/// Result of the technical dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub score: f64,
    pub signal: TechnicalSignal,
    pub reasons: Vec<String>,
    pub details: TechnicalDetails,
}

impl TechnicalAnalysis {
    /// Soft-failure result for fewer than the minimum required bars
    pub fn insufficient() -> Self {
        Self {
            score: 0.0,
            signal: TechnicalSignal::Hold,
            reasons: vec!["Insufficient price history for technical analysis".to_string()],
            details: TechnicalDetails {
                short_term: TrendWindow::neutral(),
                intermediate: TrendWindow::neutral(),
                long_term: TrendWindow::neutral(),
                sma_5: None,
                sma_10: None,
                sma_20: None,
                sma_20_from_provider: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderDetails {
    pub buy_count: u32,
    pub sell_count: u32,
    pub buy_shares: f64,
    pub sell_shares: f64,
    /// Up to 5 most recent filings, newest first
    pub recent: Vec<InsiderTransaction>,
}

/// Result of the insider-sentiment dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderAnalysis {
    pub score: f64,
    pub sentiment: InsiderSentiment,
    pub reasons: Vec<String>,
    pub details: InsiderDetails,
}

impl InsiderAnalysis {
    pub fn neutral(reason: &str) -> Self {
        Self {
            score: 50.0,
            sentiment: InsiderSentiment::Neutral,
            reasons: vec![reason.to_string()],
            details: InsiderDetails {
                buy_count: 0,
                sell_count: 0,
                buy_shares: 0.0,
                sell_shares: 0.0,
                recent: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDetails {
    pub daily_change_pct: f64,
    pub weekly_change_pct: f64,
    pub monthly_change_pct: f64,
    pub sma_5: Option<f64>,
    pub sma_20: Option<f64>,
    pub volume_ratio: Option<f64>,
}

/// Result of the price-momentum dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub score: f64,
    pub trend: PriceTrend,
    pub reasons: Vec<String>,
    pub details: PriceDetails,
}

impl PriceAnalysis {
    pub fn neutral(reason: &str) -> Self {
        Self {
            score: 50.0,
            trend: PriceTrend::Neutral,
            reasons: vec![reason.to_string()],
            details: PriceDetails {
                daily_change_pct: 0.0,
                weekly_change_pct: 0.0,
                monthly_change_pct: 0.0,
                sma_5: None,
                sma_20: None,
                volume_ratio: None,
            },
        }
    }
}

/// Weights applied when combining the three dimension scores.
/// Defaults follow the production configuration; any set of non-negative
/// weights works, the composer renormalizes over dimensions that had data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub technical: f64,
    pub insider: f64,
    pub price: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            insider: 0.4,
            price: 0.2,
        }
    }
}

/// The cached entity served to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub name: String,
    /// Rounded composite score in [0, 100]
    pub score: u32,
    pub label: RecommendationLabel,
    /// At most 5 reasons, technical first
    pub key_reasons: Vec<String>,
    pub technical: TechnicalAnalysis,
    pub insider: InsiderAnalysis,
    pub price: PriceAnalysis,
    pub price_usd: Option<f64>,
    pub currency: String,
    pub exchange: String,
    pub last_updated: DateTime<Utc>,
}

impl Recommendation {
    /// Fully-degraded fallback used when every upstream fetch failed.
    /// Always well-formed so the cache and scheduler never see an error.
    pub fn neutral(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            name: symbol.to_uppercase(),
            score: 50,
            label: RecommendationLabel::Neutral,
            key_reasons: vec!["Insufficient data for a detailed recommendation".to_string()],
            technical: TechnicalAnalysis::insufficient(),
            insider: InsiderAnalysis::neutral("No recent insider trading data"),
            price: PriceAnalysis::neutral("Insufficient price history for trend analysis"),
            price_usd: None,
            currency: "USD".to_string(),
            exchange: "Unknown".to_string(),
            last_updated: Utc::now(),
        }
    }
}
