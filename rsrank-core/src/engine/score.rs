//! The RS scoring formula.

use super::returns::{Horizon, HorizonReturns};

/// Fixed weight of a horizon: the 3-month return counts double.
pub const fn horizon_weight(horizon: Horizon) -> f64 {
    match horizon {
        Horizon::ThreeMonth => 2.0,
        Horizon::SixMonth | Horizon::NineMonth | Horizon::TwelveMonth => 1.0,
    }
}

/// `2×r[3m] + r[6m] + r[9m] + r[12m]`, missing horizons counting as zero.
pub fn rs_score(relative: &HorizonReturns) -> f64 {
    Horizon::ALL
        .iter()
        .map(|&h| horizon_weight(h) * relative.get(h))
        .sum()
}

/// Human-readable formula, written into the rankings artifact.
pub fn formula_description(benchmark_name: &str) -> String {
    format!("RS = 2×(3m relative vs {benchmark_name}) + 6m + 9m + 12m relative performance")
}
