//! Tradable-universe filter.
//!
//! The reference listing contains warrants, units, rights, preferreds and
//! test symbols alongside common stock. Ranking only wants plain tickers:
//! at most six characters, uppercase letters and digits, with at most one
//! interior dot for share classes (`BRK.B`).

use std::collections::HashSet;

pub const MAX_SYMBOL_LEN: usize = 6;

pub fn is_common_stock_symbol(symbol: &str) -> bool {
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return false;
    }
    if symbol.starts_with('.') || symbol.ends_with('.') {
        return false;
    }
    if symbol.matches('.').count() > 1 {
        return false;
    }
    symbol
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
}

/// Keep common-stock-like symbols, first occurrence wins, order preserved.
pub fn filter_universe<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(Into::into)
        .filter(|s| is_common_stock_symbol(s))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
