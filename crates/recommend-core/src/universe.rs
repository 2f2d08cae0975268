//! Static partition of the tracked symbol universe.
//!
//! Data, not logic: the refresh scheduler walks the concatenation of these
//! tables in a fixed round-robin order, and the fetch pipeline uses the
//! fund tables to skip insider-transaction lookups (funds have no filings).

/// Index ETFs and broad-market benchmarks
pub const INDEX_ETFS: &[&str] = &["SPY", "QQQ", "DIA", "IWM", "VTI"];

/// Large-cap technology stocks
pub const TECH_STOCKS: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA"];

/// SPDR sector ETFs
pub const SECTOR_ETFS: &[&str] = &[
    "XLK", "XLF", "XLE", "XLV", "XLI", "XLY", "XLP", "XLU", "XLB", "XLRE", "XLC",
];

/// The full tracked universe in round-robin order: indices, then tech
/// stocks, then sectors.
pub fn full_universe() -> Vec<String> {
    INDEX_ETFS
        .iter()
        .chain(TECH_STOCKS.iter())
        .chain(SECTOR_ETFS.iter())
        .map(|s| s.to_string())
        .collect()
}

/// True for symbols that structurally have no insider filings
pub fn is_fund(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    INDEX_ETFS.contains(&upper.as_str()) || SECTOR_ETFS.contains(&upper.as_str())
}
