use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use stratforge::domain::ranking::{SortDirection, SortKey, rank};
use stratforge::domain::types::{
    BacktestAnalysis, BacktestInput, BacktestRecord, Market, MetricsSummary, RiskTolerance,
    SavedStrategy, ScriptVersion, Strategy, TradingStyle,
};

fn metrics(net_profit: &str, win_rate: &str) -> MetricsSummary {
    MetricsSummary {
        net_profit: net_profit.to_string(),
        total_trades: 40,
        win_rate: win_rate.to_string(),
        profit_factor: 1.3,
        max_drawdown: "6%".to_string(),
    }
}

fn run_with(net_profit: &str, win_rate: &str) -> BacktestRecord {
    BacktestRecord {
        input: BacktestInput {
            asset: "BTCUSDT".to_string(),
            timeframe: "1h".to_string(),
            start_date: None,
            end_date: None,
        },
        metrics: metrics(net_profit, win_rate),
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

fn saved(name: &str, confidence: f64, highlights: MetricsSummary, day: u32) -> SavedStrategy {
    SavedStrategy {
        strategy: Strategy {
            strategy_name: name.to_string(),
            description: "test".to_string(),
            generation_rationale: "test".to_string(),
            trading_style: TradingStyle::SwingTrading,
            market: Market::Stocks,
            risk_tolerance: RiskTolerance::Low,
            pine_script_version: ScriptVersion::V5,
            parameters: BTreeMap::new(),
            pine_script: "//@version=5".to_string(),
            confidence_score: confidence,
            backtest_highlights: highlights,
            logic_breakdown: Vec::new(),
        },
        id: Uuid::new_v4(),
        saved_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        backtest_history: Vec::new(),
    }
}

fn names(entries: &[SavedStrategy]) -> Vec<&str> {
    entries.iter().map(|s| s.name()).collect()
}

#[test]
fn best_win_rate_considers_history_not_just_highlights() {
    // A: highlight 40% but one run hit 65%. B: highlight 50%, no runs.
    let mut a = saved("A", 0.5, metrics("10%", "40%"), 1);
    a.backtest_history.push(run_with("8%", "65%"));
    let b = saved("B", 0.5, metrics("10%", "50%"), 2);

    let ranked = rank(&[a, b], SortKey::BestWinRate, SortDirection::Descending);
    assert_eq!(names(&ranked), ["A", "B"]);
}

#[test]
fn best_net_profit_takes_maximum_across_all_runs() {
    let mut a = saved("A", 0.5, metrics("5%", "50%"), 1);
    a.backtest_history.push(run_with("-2%", "48%"));
    a.backtest_history.push(run_with("31%", "44%"));
    let b = saved("B", 0.5, metrics("12%", "50%"), 2);

    let ranked = rank(&[b, a], SortKey::BestNetProfit, SortDirection::Descending);
    assert_eq!(names(&ranked), ["A", "B"]);
}

#[test]
fn malformed_metrics_sort_last_descending() {
    let a = saved("A", 0.5, metrics("n/a", "n/a"), 1);
    let b = saved("B", 0.5, metrics("1%", "1%"), 2);

    let ranked = rank(
        &[a.clone(), b.clone()],
        SortKey::BestWinRate,
        SortDirection::Descending,
    );
    assert_eq!(names(&ranked), ["B", "A"]);

    let ranked = rank(&[a, b], SortKey::BestWinRate, SortDirection::Ascending);
    assert_eq!(names(&ranked), ["A", "B"]);
}

#[test]
fn name_sort_is_case_insensitive() {
    let entries = [
        saved("zebra", 0.5, metrics("1%", "1%"), 1),
        saved("Alpha", 0.5, metrics("1%", "1%"), 2),
        saved("mango", 0.5, metrics("1%", "1%"), 3),
    ];

    let ranked = rank(&entries, SortKey::Name, SortDirection::Ascending);
    assert_eq!(names(&ranked), ["Alpha", "mango", "zebra"]);
}

#[test]
fn saved_at_direction_flips_polarity() {
    let entries = [
        saved("old", 0.5, metrics("1%", "1%"), 1),
        saved("new", 0.5, metrics("1%", "1%"), 20),
        saved("mid", 0.5, metrics("1%", "1%"), 10),
    ];

    let descending = rank(&entries, SortKey::SavedAt, SortDirection::Descending);
    assert_eq!(names(&descending), ["new", "mid", "old"]);

    let ascending = rank(&entries, SortKey::SavedAt, SortDirection::Ascending);
    assert_eq!(names(&ascending), ["old", "mid", "new"]);
}

#[test]
fn confidence_sort_with_stable_ties() {
    let entries = [
        saved("first", 0.8, metrics("1%", "1%"), 1),
        saved("tie-a", 0.5, metrics("1%", "1%"), 2),
        saved("tie-b", 0.5, metrics("1%", "1%"), 3),
        saved("tie-c", 0.5, metrics("1%", "1%"), 4),
    ];

    let descending = rank(&entries, SortKey::ConfidenceScore, SortDirection::Descending);
    assert_eq!(names(&descending), ["first", "tie-a", "tie-b", "tie-c"]);

    // Ties keep input order in the other direction too.
    let ascending = rank(&entries, SortKey::ConfidenceScore, SortDirection::Ascending);
    assert_eq!(names(&ascending), ["tie-a", "tie-b", "tie-c", "first"]);
}

#[test]
fn rank_never_mutates_its_input() {
    let entries = vec![
        saved("b", 0.2, metrics("1%", "1%"), 2),
        saved("a", 0.9, metrics("2%", "2%"), 1),
    ];
    let before = entries.clone();

    let _ = rank(&entries, SortKey::Name, SortDirection::Ascending);
    assert_eq!(entries, before);
}
