//! Pure scoring functions: technical, insider-sentiment and price-momentum
//! analyses plus the weighted composite recommendation builder.
//!
//! Every function here is deterministic given identical inputs and total:
//! partial or missing data degrades to a neutral result with an explanatory
//! reason instead of an error.

pub mod compose;
pub mod insider;
pub mod price;
pub mod technical;

pub use compose::compose_recommendation;
pub use insider::analyze_insider_trading;
pub use price::analyze_price_trends;
pub use technical::analyze_technical;

use recommend_core::Bar;

/// Minimum bars for the technical dimension to produce a signal
pub const MIN_TECHNICAL_BARS: usize = 5;

/// Minimum bars for the price-momentum dimension to produce a signal
pub const MIN_PRICE_BARS: usize = 10;

/// Arithmetic mean of the trailing `window` closes. `None` when there is
/// not enough history.
pub(crate) fn trailing_sma(bars: &[Bar], window: usize) -> Option<f64> {
    if window == 0 || bars.len() < window {
        return None;
    }
    let sum: f64 = bars[bars.len() - window..].iter().map(|b| b.close).sum();
    Some(sum / window as f64)
}
