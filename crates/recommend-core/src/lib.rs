pub mod error;
pub mod traits;
pub mod types;
pub mod universe;

pub use error::RadarError;
pub use traits::MarketDataProvider;
pub use types::{
    Bar, IndicatorPoint, InsiderAnalysis, InsiderDetails, InsiderSentiment, InsiderTransaction,
    PriceAnalysis, PriceDetails, PriceTrend, Recommendation, RecommendationLabel, ScoreWeights,
    TechnicalAnalysis, TechnicalDetails, TechnicalSignal, TickerMeta, TransactionKind,
    TrendDirection, TrendWindow,
};
