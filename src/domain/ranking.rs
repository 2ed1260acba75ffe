//! Derived ordering of the strategy library.
//!
//! Ranking is a pure projection: it never mutates the collection and is
//! recomputed on every call, so there is no cached aggregate to keep in sync
//! with history appends.

use crate::domain::types::{MetricsSummary, SavedStrategy};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    SavedAt,
    Name,
    ConfidenceScore,
    BestWinRate,
    BestNetProfit,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::SavedAt => write!(f, "savedAt"),
            SortKey::Name => write!(f, "name"),
            SortKey::ConfidenceScore => write!(f, "confidenceScore"),
            SortKey::BestWinRate => write!(f, "bestWinRate"),
            SortKey::BestNetProfit => write!(f, "bestNetProfit"),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "savedat" | "saved-at" | "date" => Ok(SortKey::SavedAt),
            "name" => Ok(SortKey::Name),
            "confidencescore" | "confidence" => Ok(SortKey::ConfidenceScore),
            "bestwinrate" | "win-rate" | "winrate" => Ok(SortKey::BestWinRate),
            "bestnetprofit" | "net-profit" | "netprofit" => Ok(SortKey::BestNetProfit),
            _ => anyhow::bail!(
                "Invalid sort key: {}. Must be one of savedAt, name, confidenceScore, bestWinRate, bestNetProfit",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => anyhow::bail!("Invalid sort direction: {}. Must be 'asc' or 'desc'", s),
        }
    }
}

/// Parse the leading numeric prefix of a service-emitted metric string.
///
/// The generation service formats percentages with no guaranteed shape
/// ("65%", "+12.4 %", "n/a"). The rule is: optional sign, digits with at most
/// one decimal point, stop at the first other character. Anything without a
/// digit prefix ranks as negative infinity so it sorts last in descending
/// order.
pub fn metric_value(raw: &str) -> f64 {
    let s = raw.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return f64::NEG_INFINITY;
    }
    s[..end].parse().unwrap_or(f64::NEG_INFINITY)
}

fn best_of(saved: &SavedStrategy, pick: impl Fn(&MetricsSummary) -> f64) -> f64 {
    let highlight = pick(&saved.strategy.backtest_highlights);
    saved
        .backtest_history
        .iter()
        .map(|run| pick(&run.metrics))
        .fold(highlight, f64::max)
}

/// Best win rate across the highlight metrics and every backtest run.
pub fn best_win_rate(saved: &SavedStrategy) -> f64 {
    best_of(saved, |m| metric_value(&m.win_rate))
}

/// Best net profit across the highlight metrics and every backtest run.
pub fn best_net_profit(saved: &SavedStrategy) -> f64 {
    best_of(saved, |m| metric_value(&m.net_profit))
}

fn compare(a: &SavedStrategy, b: &SavedStrategy, key: SortKey) -> Ordering {
    match key {
        SortKey::SavedAt => a.saved_at.cmp(&b.saved_at),
        SortKey::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortKey::ConfidenceScore => a
            .strategy
            .confidence_score
            .total_cmp(&b.strategy.confidence_score),
        SortKey::BestWinRate => best_win_rate(a).total_cmp(&best_win_rate(b)),
        SortKey::BestNetProfit => best_net_profit(a).total_cmp(&best_net_profit(b)),
    }
}

/// Sorted projection of the library. Stable: ties keep input order in either
/// direction.
pub fn rank(
    entries: &[SavedStrategy],
    key: SortKey,
    direction: SortDirection,
) -> Vec<SavedStrategy> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    sorted
}
