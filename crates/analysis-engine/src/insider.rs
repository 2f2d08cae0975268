use chrono::{Duration, Utc};
use recommend_core::{
    InsiderAnalysis, InsiderDetails, InsiderSentiment, InsiderTransaction, TransactionKind,
};

/// Filings older than this are ignored
const LOOKBACK_DAYS: i64 = 30;

/// How many filings to surface for display
const RECENT_LIMIT: usize = 5;

/// Score insider sentiment from the trailing 30 days of filings.
/// Share volume is weighted more heavily than the raw transaction count
/// since volume better reflects conviction. The input is never mutated.
pub fn analyze_insider_trading(transactions: &[InsiderTransaction]) -> InsiderAnalysis {
    if transactions.is_empty() {
        return InsiderAnalysis::neutral("No recent insider trading data");
    }

    let cutoff = Utc::now() - Duration::days(LOOKBACK_DAYS);
    let mut recent: Vec<&InsiderTransaction> = transactions
        .iter()
        .filter(|t| t.filing_date.is_some_and(|d| d >= cutoff))
        .collect();

    if recent.is_empty() {
        return InsiderAnalysis::neutral("No recent insider trading data");
    }

    let mut buy_count = 0u32;
    let mut sell_count = 0u32;
    let mut buy_shares = 0.0f64;
    let mut sell_shares = 0.0f64;

    for txn in &recent {
        let shares = txn.shares.unwrap_or(0.0).abs();
        match txn.kind() {
            TransactionKind::Buy => {
                buy_count += 1;
                buy_shares += shares;
            }
            TransactionKind::Sell => {
                sell_count += 1;
                sell_shares += shares;
            }
            TransactionKind::Other => {}
        }
    }

    recent.sort_by(|a, b| b.filing_date.cmp(&a.filing_date));
    let recent: Vec<InsiderTransaction> =
        recent.into_iter().take(RECENT_LIMIT).cloned().collect();

    let details = InsiderDetails {
        buy_count,
        sell_count,
        buy_shares,
        sell_shares,
        recent,
    };

    if buy_count + sell_count == 0 {
        return InsiderAnalysis {
            details,
            ..InsiderAnalysis::neutral("No open-market insider buys or sells in the last 30 days")
        };
    }

    let transaction_ratio = f64::from(buy_count) / f64::from(buy_count + sell_count);
    let total_shares = buy_shares + sell_shares;
    let volume_ratio = if total_shares > 0.0 {
        buy_shares / total_shares
    } else {
        // No share counts reported; fall back to the transaction ratio
        transaction_ratio
    };

    let score = ((volume_ratio * 0.7 + transaction_ratio * 0.3) * 100.0).round();
    let sentiment = InsiderSentiment::from_score(score);

    let reason = match sentiment {
        InsiderSentiment::VeryBullish => format!(
            "Heavy insider buying in the last 30 days ({} buys vs {} sells)",
            buy_count, sell_count
        ),
        InsiderSentiment::Bullish => format!(
            "Insider buying outweighs selling ({} buys vs {} sells)",
            buy_count, sell_count
        ),
        InsiderSentiment::Neutral => "Mixed insider activity in the last 30 days".to_string(),
        InsiderSentiment::Bearish => format!(
            "Insider selling outweighs buying ({} sells vs {} buys)",
            sell_count, buy_count
        ),
        InsiderSentiment::VeryBearish => format!(
            "Heavy insider selling in the last 30 days ({} sells vs {} buys)",
            sell_count, buy_count
        ),
    };

    InsiderAnalysis {
        score,
        sentiment,
        reasons: vec![reason],
        details,
    }
}
