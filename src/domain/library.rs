//! The durable strategy collection and its mutation rules.

use crate::domain::types::{BacktestRecord, SavedStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All saved strategies of one user, keyed by id.
///
/// Stored order is incidental; any ordering shown to the user is a derived
/// view (see [`crate::domain::ranking`]). Serializes as a bare JSON array so
/// libraries written by earlier versions of the store load unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyLibrary {
    entries: Vec<SavedStrategy>,
}

impl StrategyLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SavedStrategy] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedStrategy> {
        self.entries.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&SavedStrategy> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Insert a newly saved strategy. Returns false without touching the
    /// collection if the id is already present; ids are unique by
    /// construction, so a hit here means the caller tried to re-save an
    /// already-durable artifact.
    pub fn insert(&mut self, saved: SavedStrategy) -> bool {
        if self.contains(saved.id) {
            return false;
        }
        self.entries.push(saved);
        true
    }

    /// Remove by id, returning the removed entry if it existed.
    pub fn remove(&mut self, id: Uuid) -> Option<SavedStrategy> {
        let index = self.entries.iter().position(|s| s.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Prepend a backtest record to the matching entry's history.
    ///
    /// Newest-first: the record lands at index 0 and prior entries keep their
    /// relative order. An absent id is a silent no-op (a backtest against an
    /// unsaved or stale artifact is simply not recorded); returns whether a
    /// history changed. No other entry is touched.
    pub fn append_backtest(&mut self, id: Uuid, record: BacktestRecord) -> bool {
        match self.entries.iter_mut().find(|s| s.id == id) {
            Some(entry) => {
                entry.backtest_history.insert(0, record);
                true
            }
            None => false,
        }
    }
}

impl<'a> IntoIterator for &'a StrategyLibrary {
    type Item = &'a SavedStrategy;
    type IntoIter = std::slice::Iter<'a, SavedStrategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        BacktestAnalysis, BacktestInput, Market, MetricsSummary, Preferences, RiskTolerance,
        ScriptVersion, Strategy, TradingStyle,
    };
    use std::collections::BTreeMap;

    fn preferences() -> Preferences {
        Preferences {
            trading_style: TradingStyle::DayTrading,
            market: Market::Crypto,
            risk_tolerance: RiskTolerance::Medium,
            capital: 10_000.0,
            pine_script_version: ScriptVersion::V5,
        }
    }

    fn strategy(name: &str) -> Strategy {
        let prefs = preferences();
        Strategy {
            strategy_name: name.to_string(),
            description: "test".to_string(),
            generation_rationale: "test".to_string(),
            trading_style: prefs.trading_style,
            market: prefs.market,
            risk_tolerance: prefs.risk_tolerance,
            pine_script_version: prefs.pine_script_version,
            parameters: BTreeMap::new(),
            pine_script: "//@version=5".to_string(),
            confidence_score: 0.5,
            backtest_highlights: MetricsSummary {
                net_profit: "10%".to_string(),
                total_trades: 50,
                win_rate: "50%".to_string(),
                profit_factor: 1.2,
                max_drawdown: "5%".to_string(),
            },
            logic_breakdown: Vec::new(),
        }
    }

    fn record(asset: &str) -> BacktestRecord {
        BacktestRecord {
            input: BacktestInput {
                asset: asset.to_string(),
                timeframe: "1h".to_string(),
                start_date: None,
                end_date: None,
            },
            metrics: MetricsSummary {
                net_profit: "4%".to_string(),
                total_trades: 12,
                win_rate: "58%".to_string(),
                profit_factor: 1.5,
                max_drawdown: "2%".to_string(),
            },
            analysis: BacktestAnalysis {
                strengths: "s".to_string(),
                weaknesses: "w".to_string(),
                suggestion: "x".to_string(),
            },
            chart_data: Vec::new(),
            trades: Vec::new(),
            updated_pine_script: "//@version=5".to_string(),
        }
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut library = StrategyLibrary::new();
        let saved = strategy("A").saved_as("A");

        assert!(library.insert(saved.clone()));
        assert!(!library.insert(saved));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn append_prepends_newest_first() {
        let mut library = StrategyLibrary::new();
        let saved = strategy("A").saved_as("A");
        let id = saved.id;
        library.insert(saved);

        assert!(library.append_backtest(id, record("BTCUSDT")));
        assert!(library.append_backtest(id, record("ETHUSDT")));

        let history = &library.get(id).unwrap().backtest_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].input.asset, "ETHUSDT");
        assert_eq!(history[1].input.asset, "BTCUSDT");
    }

    #[test]
    fn append_on_missing_id_is_noop() {
        let mut library = StrategyLibrary::new();
        library.insert(strategy("A").saved_as("A"));

        assert!(!library.append_backtest(Uuid::new_v4(), record("BTCUSDT")));
        assert!(library.iter().all(|s| s.backtest_history.is_empty()));
    }

    #[test]
    fn append_leaves_other_entries_untouched() {
        let mut library = StrategyLibrary::new();
        let a = strategy("A").saved_as("A");
        let b = strategy("B").saved_as("B");
        let (id_a, id_b) = (a.id, b.id);
        library.insert(a);
        library.insert(b);

        let before_b = library.get(id_b).unwrap().clone();
        library.append_backtest(id_a, record("BTCUSDT"));

        assert_eq!(library.get(id_b).unwrap(), &before_b);
    }

    #[test]
    fn remove_takes_exactly_one_entry() {
        let mut library = StrategyLibrary::new();
        let a = strategy("A").saved_as("A");
        let b = strategy("B").saved_as("B");
        let id_a = a.id;
        library.insert(a);
        library.insert(b);

        let removed = library.remove(id_a).unwrap();
        assert_eq!(removed.id, id_a);
        assert_eq!(library.len(), 1);
        assert!(library.remove(id_a).is_none());
    }

    #[test]
    fn serializes_as_bare_array() {
        let mut library = StrategyLibrary::new();
        library.insert(strategy("A").saved_as("A"));

        let json = serde_json::to_value(&library).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 1);
    }
}
