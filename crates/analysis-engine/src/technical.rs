use crate::{trailing_sma, MIN_TECHNICAL_BARS};
use recommend_core::{
    Bar, IndicatorPoint, TechnicalAnalysis, TechnicalDetails, TechnicalSignal, TrendDirection,
    TrendWindow,
};

/// Percent change across the trailing `window` bars. Shorter histories are
/// clamped to whatever is available.
fn trend_window(bars: &[Bar], window: usize) -> TrendWindow {
    let start = bars.len().saturating_sub(window);
    let slice = &bars[start..];
    let (Some(first), Some(last)) = (slice.first(), slice.last()) else {
        return TrendWindow::neutral();
    };
    if first.close == 0.0 {
        return TrendWindow::neutral();
    }
    let percent_change = (last.close - first.close) / first.close * 100.0;
    let direction = if percent_change > 1.0 {
        TrendDirection::Up
    } else if percent_change < -1.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    TrendWindow {
        direction,
        percent_change,
    }
}

/// Last usable value of a provider indicator series, if any
fn provider_sma(series: Option<&[IndicatorPoint]>) -> Option<f64> {
    series?.iter().rev().find_map(|p| p.value)
}

/// Score the technical dimension from 5/14/30-bar trends and 5/10/20-bar
/// moving averages. An externally supplied SMA-20 series overrides the
/// locally computed value.
pub fn analyze_technical(
    bars: &[Bar],
    indicator_series: Option<&[IndicatorPoint]>,
) -> TechnicalAnalysis {
    if bars.len() < MIN_TECHNICAL_BARS {
        return TechnicalAnalysis::insufficient();
    }

    let short_term = trend_window(bars, 5);
    let intermediate = trend_window(bars, 14);
    let long_term = trend_window(bars, 30);

    let sma_5 = trailing_sma(bars, 5);
    let sma_10 = trailing_sma(bars, 10);
    let local_sma_20 = trailing_sma(bars, 20);
    let external_sma_20 = provider_sma(indicator_series);
    let sma_20_from_provider = external_sma_20.is_some();
    let sma_20 = external_sma_20.or(local_sma_20);

    let last_close = bars[bars.len() - 1].close;

    let mut score: f64 = 50.0;
    let mut reasons = Vec::new();

    for (window, weight, label) in [
        (&short_term, 10.0, "short-term"),
        (&intermediate, 7.0, "intermediate-term"),
        (&long_term, 5.0, "long-term"),
    ] {
        match window.direction {
            TrendDirection::Up => {
                score += weight;
                reasons.push(format!("Positive {} price trend", label));
            }
            TrendDirection::Down => {
                score -= weight;
                reasons.push(format!("Negative {} price trend", label));
            }
            TrendDirection::Neutral => {}
        }
    }

    if let (Some(fast), Some(slow)) = (sma_5, sma_20) {
        if fast > slow {
            score += 5.0;
            reasons.push("5-day average above 20-day average".to_string());
        } else if fast < slow {
            score -= 5.0;
            reasons.push("5-day average below 20-day average".to_string());
        }
    }

    if let (Some(fast), Some(slow)) = (sma_5, sma_10) {
        if fast > slow {
            score += 3.0;
        } else if fast < slow {
            score -= 3.0;
        }
    }

    if let Some(fast) = sma_5 {
        if last_close > fast {
            score += 5.0;
            reasons.push("Price trading above its 5-day average".to_string());
        } else if last_close < fast {
            score -= 5.0;
            reasons.push("Price trading below its 5-day average".to_string());
        }
    }

    if let Some(slow) = sma_20 {
        if last_close > slow {
            score += 5.0;
            reasons.push("Price trading above its 20-day average".to_string());
        } else if last_close < slow {
            score -= 5.0;
            reasons.push("Price trading below its 20-day average".to_string());
        }
    }

    let score = score.clamp(0.0, 100.0);

    TechnicalAnalysis {
        score,
        signal: TechnicalSignal::from_score(score),
        reasons,
        details: TechnicalDetails {
            short_term,
            intermediate,
            long_term,
            sma_5,
            sma_10,
            sma_20,
            sma_20_from_provider,
        },
    }
}
