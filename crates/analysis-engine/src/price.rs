use crate::{trailing_sma, MIN_PRICE_BARS};
use recommend_core::{Bar, PriceAnalysis, PriceDetails, PriceTrend};

/// Volume confirmation kicks in above this ratio of latest to average volume
const VOLUME_SURGE_RATIO: f64 = 1.2;

/// Percent change from the bar at `lookback` positions before the last bar,
/// clamped to the start of the series for short histories.
fn change_from(bars: &[Bar], lookback: usize) -> f64 {
    let last = bars[bars.len() - 1].close;
    let idx = bars.len().saturating_sub(lookback);
    let base = bars[idx].close;
    if base == 0.0 {
        return 0.0;
    }
    (last - base) / base * 100.0
}

/// Latest volume relative to the mean of the last 5 positive volumes
fn volume_ratio(bars: &[Bar]) -> Option<f64> {
    let latest = bars[bars.len() - 1].volume;
    let recent: Vec<f64> = bars
        .iter()
        .rev()
        .map(|b| b.volume)
        .filter(|v| *v > 0.0)
        .take(5)
        .collect();
    if recent.is_empty() {
        return None;
    }
    let avg = recent.iter().sum::<f64>() / recent.len() as f64;
    if avg == 0.0 {
        None
    } else {
        Some(latest / avg)
    }
}

/// Score price momentum from daily/weekly/monthly changes with volume
/// confirmation and a 5-vs-20 day moving-average check.
pub fn analyze_price_trends(bars: &[Bar]) -> PriceAnalysis {
    if bars.len() < MIN_PRICE_BARS {
        return PriceAnalysis::neutral("Insufficient price history for trend analysis");
    }

    let daily = change_from(bars, 2);
    let weekly = change_from(bars, 6);
    let monthly = change_from(bars, 21);

    let sma_5 = trailing_sma(bars, 5);
    let sma_20 = trailing_sma(bars, 20);
    let vol_ratio = volume_ratio(bars);

    let mut score = 50.0 + daily * 2.0 + weekly * 1.0 + monthly * 0.5;
    let mut reasons = Vec::new();

    if weekly > 1.0 {
        reasons.push(format!("Up {:.1}% over the past week", weekly));
    } else if weekly < -1.0 {
        reasons.push(format!("Down {:.1}% over the past week", weekly.abs()));
    }
    if monthly > 2.0 {
        reasons.push(format!("Up {:.1}% over the past month", monthly));
    } else if monthly < -2.0 {
        reasons.push(format!("Down {:.1}% over the past month", monthly.abs()));
    }

    if let (Some(fast), Some(slow)) = (sma_5, sma_20) {
        if fast > slow {
            score += 5.0;
            reasons.push("Short-term momentum above the 20-day baseline".to_string());
        } else {
            score -= 5.0;
        }
    }

    if let Some(ratio) = vol_ratio {
        if daily > 0.0 && ratio > VOLUME_SURGE_RATIO {
            score += 5.0;
            reasons.push("Above-average volume confirms the advance".to_string());
        } else if daily < 0.0 && ratio > VOLUME_SURGE_RATIO {
            score -= 5.0;
            reasons.push("Above-average volume confirms the decline".to_string());
        }
    }

    let score = score.clamp(0.0, 100.0);

    PriceAnalysis {
        score,
        trend: PriceTrend::from_score(score),
        reasons,
        details: PriceDetails {
            daily_change_pct: daily,
            weekly_change_pct: weekly,
            monthly_change_pct: monthly,
            sma_5,
            sma_20,
            volume_ratio: vol_ratio,
        },
    }
}
