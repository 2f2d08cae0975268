use crate::{
    analyze_insider_trading, analyze_price_trends, analyze_technical, MIN_PRICE_BARS,
    MIN_TECHNICAL_BARS,
};
use chrono::Utc;
use recommend_core::{
    Bar, IndicatorPoint, InsiderTransaction, Recommendation, RecommendationLabel, ScoreWeights,
    TickerMeta,
};

/// At most this many key reasons are surfaced on the recommendation
const MAX_KEY_REASONS: usize = 5;

/// Reasons that only describe degraded inputs are not worth surfacing
fn is_degradation_reason(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    lower.contains("insufficient") || lower.contains("no recent") || lower.contains("error")
}

/// Run all three analyses and combine them into the cached entity.
///
/// Dimensions that had too little data to say anything are excluded from
/// the weighted sum and the remaining weights renormalized, so a symbol
/// with three bars and no filings lands at a neutral 50 instead of being
/// dragged down by a zero technical score. Total function: any input
/// combination yields a well-formed recommendation.
pub fn compose_recommendation(
    symbol: &str,
    bars: &[Bar],
    meta: Option<&TickerMeta>,
    transactions: &[InsiderTransaction],
    indicator_series: Option<&[IndicatorPoint]>,
    weights: &ScoreWeights,
) -> Recommendation {
    let technical = analyze_technical(bars, indicator_series);
    let insider = analyze_insider_trading(transactions);
    let price = analyze_price_trends(bars);

    let has_technical = bars.len() >= MIN_TECHNICAL_BARS;
    let has_price = bars.len() >= MIN_PRICE_BARS;
    let has_insider = insider.details.buy_count + insider.details.sell_count > 0;

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    if has_technical {
        weighted += technical.score * weights.technical;
        total_weight += weights.technical;
    }
    weighted += insider.score * weights.insider;
    total_weight += weights.insider;
    if has_price {
        weighted += price.score * weights.price;
        total_weight += weights.price;
    }

    let composite = if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 100.0)
    } else {
        50.0
    };
    let score = composite.round() as u32;

    let mut key_reasons: Vec<String> = technical
        .reasons
        .iter()
        .chain(insider.reasons.iter())
        .chain(price.reasons.iter())
        .filter(|r| !is_degradation_reason(r))
        .take(MAX_KEY_REASONS)
        .cloned()
        .collect();

    // Neutral is reserved for the case where no dimension had anything
    // to go on; a quiet market with full data still gets a real label.
    let degraded = !has_technical && !has_price && !has_insider;
    if key_reasons.is_empty() {
        key_reasons.push(
            if degraded {
                "Insufficient data for a detailed recommendation"
            } else {
                "No strong signals in either direction"
            }
            .to_string(),
        );
    }
    let label = if degraded {
        RecommendationLabel::Neutral
    } else {
        RecommendationLabel::from_score(composite)
    };

    let (name, exchange) = match meta {
        Some(m) => (m.name.clone(), m.exchange.clone()),
        None => (symbol.to_uppercase(), "Unknown".to_string()),
    };

    Recommendation {
        symbol: symbol.to_uppercase(),
        name,
        score,
        label,
        key_reasons,
        technical,
        insider,
        price,
        price_usd: bars.last().map(|b| b.close),
        currency: "USD".to_string(),
        exchange,
        last_updated: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{drifting_bars, flat_bars};
    use chrono::Duration;

    fn buy_txn(days_ago: i64, shares: f64) -> InsiderTransaction {
        InsiderTransaction {
            name: Some("John Doe".to_string()),
            title: Some("Director".to_string()),
            filing_date: Some(Utc::now() - Duration::days(days_ago)),
            transaction_type: Some("purchase".to_string()),
            shares: Some(shares),
        }
    }

    #[test]
    fn composite_matches_weighted_sub_scores_when_all_dimensions_have_data() {
        let bars = drifting_bars(30, 100.0, 0.3);
        let txns = vec![buy_txn(3, 500.0), buy_txn(10, 500.0)];
        let weights = ScoreWeights::default();

        let rec = compose_recommendation("AAPL", &bars, None, &txns, None, &weights);
        let technical = analyze_technical(&bars, None);
        let insider = analyze_insider_trading(&txns);
        let price = analyze_price_trends(&bars);

        let expected =
            (technical.score * 0.4 + insider.score * 0.4 + price.score * 0.2).round() as u32;
        assert_eq!(rec.score, expected);
    }

    #[test]
    fn composite_label_thresholds() {
        for (score, label) in [
            (80.0, RecommendationLabel::StrongBuy),
            (75.0, RecommendationLabel::StrongBuy),
            (70.0, RecommendationLabel::Buy),
            (65.0, RecommendationLabel::Buy),
            (50.0, RecommendationLabel::Hold),
            (46.0, RecommendationLabel::Hold),
            (45.0, RecommendationLabel::Sell),
            (40.0, RecommendationLabel::Sell),
            (35.0, RecommendationLabel::StrongSell),
            (20.0, RecommendationLabel::StrongSell),
            (0.0, RecommendationLabel::StrongSell),
            (100.0, RecommendationLabel::StrongBuy),
        ] {
            assert_eq!(RecommendationLabel::from_score(score), label, "score {}", score);
        }
    }

    #[test]
    fn every_integer_score_maps_to_exactly_one_label() {
        for score in 0..=100u32 {
            // from_score is a total match; this guards threshold overlap regressions
            let label = RecommendationLabel::from_score(score as f64);
            let expected = match score {
                75..=100 => RecommendationLabel::StrongBuy,
                65..=74 => RecommendationLabel::Buy,
                46..=64 => RecommendationLabel::Hold,
                36..=45 => RecommendationLabel::Sell,
                0..=35 => RecommendationLabel::StrongSell,
                _ => unreachable!(),
            };
            assert_eq!(label, expected, "score {}", score);
        }
    }

    #[test]
    fn uptrend_with_insider_buys_recommends_buying() {
        // ~+2% per week over 30 daily bars
        let bars = drifting_bars(30, 100.0, 0.4);
        let txns = vec![
            buy_txn(2, 400.0),
            buy_txn(8, 300.0),
            buy_txn(15, 300.0),
        ];
        let rec = compose_recommendation(
            "NVDA",
            &bars,
            Some(&TickerMeta {
                symbol: "NVDA".to_string(),
                name: "NVIDIA Corp".to_string(),
                exchange: "XNAS".to_string(),
            }),
            &txns,
            None,
            &ScoreWeights::default(),
        );
        assert!(rec.label.is_buy(), "got {:?} at score {}", rec.label, rec.score);
        assert_eq!(rec.name, "NVIDIA Corp");
        assert_eq!(rec.exchange, "XNAS");
        assert!(rec.key_reasons.len() <= 5);
        assert!(!rec.key_reasons.is_empty());
    }

    #[test]
    fn three_bars_and_nothing_else_degrades_to_neutral() {
        let bars = drifting_bars(3, 100.0, 1.0);
        let rec = compose_recommendation("XYZ", &bars, None, &[], None, &ScoreWeights::default());
        assert_eq!(rec.score, 50);
        assert!(matches!(
            rec.label,
            RecommendationLabel::Hold | RecommendationLabel::Neutral
        ));
        assert!(rec
            .key_reasons
            .iter()
            .any(|r| r.to_lowercase().contains("insufficient")));
        assert_eq!(rec.exchange, "Unknown");
        assert_eq!(rec.price_usd, Some(bars[2].close));
    }

    #[test]
    fn quiet_market_with_full_data_is_hold_not_neutral() {
        // Flat closes, no filings: nothing to say, but every dimension had
        // enough data, so the step function applies
        let rec = compose_recommendation(
            "SPY",
            &flat_bars(30, 100.0),
            None,
            &[],
            None,
            &ScoreWeights::default(),
        );
        // technical 50, insider 50, price 45 (flat SMA cross docks 5)
        assert_eq!(rec.score, 49);
        assert_eq!(rec.label, RecommendationLabel::Hold);
        assert_eq!(rec.key_reasons.len(), 1);
        assert!(!rec.key_reasons[0].to_lowercase().contains("insufficient"));
    }

    #[test]
    fn no_data_at_all_is_well_formed() {
        let rec = compose_recommendation("none", &[], None, &[], None, &ScoreWeights::default());
        assert_eq!(rec.symbol, "NONE");
        assert_eq!(rec.score, 50);
        assert!(rec.price_usd.is_none());
        assert!((0..=100).contains(&rec.score));
    }

    #[test]
    fn degradation_reasons_are_filtered_from_key_reasons() {
        // Enough bars for technical but not price; insider empty
        let bars = drifting_bars(7, 100.0, 1.0);
        let rec = compose_recommendation("ABC", &bars, None, &[], None, &ScoreWeights::default());
        for reason in &rec.key_reasons {
            // Either real signals survived, or only the single fallback entry
            if rec.key_reasons.len() > 1 {
                assert!(!is_degradation_reason(reason));
            }
        }
    }

    #[test]
    fn custom_weights_shift_the_composite() {
        let bars = drifting_bars(30, 100.0, 0.5);
        let all_technical = ScoreWeights {
            technical: 1.0,
            insider: 0.0,
            price: 0.0,
        };
        let rec = compose_recommendation("AAPL", &bars, None, &[], None, &all_technical);
        let technical = analyze_technical(&bars, None);
        assert_eq!(rec.score, technical.score.round() as u32);
    }
}
