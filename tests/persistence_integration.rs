use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use stratforge::domain::library::StrategyLibrary;
use stratforge::domain::ports::BlobStore;
use stratforge::domain::types::{
    BacktestAnalysis, BacktestInput, BacktestRecord, Market, MetricsSummary, RiskTolerance,
    ScriptVersion, Strategy, TradingStyle,
};
use stratforge::infrastructure::library_persistence::{JsonFileStore, LibraryGateway};

fn strategy(name: &str) -> Strategy {
    Strategy {
        strategy_name: name.to_string(),
        description: "persistence test".to_string(),
        generation_rationale: "persistence test".to_string(),
        trading_style: TradingStyle::PositionTrading,
        market: Market::Commodities,
        risk_tolerance: RiskTolerance::Aggressive,
        pine_script_version: ScriptVersion::V6,
        parameters: BTreeMap::new(),
        pine_script: "//@version=6".to_string(),
        confidence_score: 0.81,
        backtest_highlights: MetricsSummary {
            net_profit: "25%".to_string(),
            total_trades: 64,
            win_rate: "47%".to_string(),
            profit_factor: 1.9,
            max_drawdown: "14%".to_string(),
        },
        logic_breakdown: Vec::new(),
    }
}

fn record(asset: &str) -> BacktestRecord {
    BacktestRecord {
        input: BacktestInput {
            asset: asset.to_string(),
            timeframe: "4h".to_string(),
            start_date: Some("2026-01-01".to_string()),
            end_date: Some("2026-03-01".to_string()),
        },
        metrics: MetricsSummary {
            net_profit: "9%".to_string(),
            total_trades: 18,
            win_rate: "61%".to_string(),
            profit_factor: 2.1,
            max_drawdown: "5%".to_string(),
        },
        analysis: BacktestAnalysis {
            strengths: "strong trends".to_string(),
            weaknesses: "whipsaws".to_string(),
            suggestion: "wider stops".to_string(),
        },
        chart_data: Vec::new(),
        trades: Vec::new(),
        updated_pine_script: "//@version=6 // pinned".to_string(),
    }
}

fn gateway_at(dir: &std::path::Path) -> LibraryGateway {
    LibraryGateway::new(Arc::new(JsonFileStore::with_dir(dir)))
}

#[test]
fn roundtrip_empty_library() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = gateway_at(dir.path());

    gateway.save(&StrategyLibrary::new()).unwrap();
    assert!(gateway.load().is_empty());
}

#[test]
fn roundtrip_preserves_nested_history() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = gateway_at(dir.path());

    let mut library = StrategyLibrary::new();
    let one = strategy("One").saved_as("One");
    let id_one = one.id;
    library.insert(one);
    library.append_backtest(id_one, record("GOLD"));
    library.append_backtest(id_one, record("SILVER"));

    let two = strategy("Two").saved_as("Two");
    library.insert(two);

    gateway.save(&library).unwrap();
    let reloaded = gateway.load();

    assert_eq!(reloaded, library);
    let history = &reloaded.get(id_one).unwrap().backtest_history;
    assert_eq!(history[0].input.asset, "SILVER");
    assert_eq!(history[1].input.asset, "GOLD");
    assert_eq!(history[0].input.start_date.as_deref(), Some("2026-01-01"));
}

#[test]
fn load_of_absent_blob_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(gateway_at(dir.path()).load().is_empty());
}

#[test]
fn load_of_corrupt_blob_falls_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("strategies.json"), "{ not json").unwrap();

    assert!(gateway_at(dir.path()).load().is_empty());
}

#[test]
fn load_of_wrong_shape_falls_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("strategies.json"), "{\"a\": 1}").unwrap();

    assert!(gateway_at(dir.path()).load().is_empty());
}

#[test]
fn save_replaces_whole_collection() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = gateway_at(dir.path());

    let mut library = StrategyLibrary::new();
    library.insert(strategy("One").saved_as("One"));
    library.insert(strategy("Two").saved_as("Two"));
    gateway.save(&library).unwrap();

    let mut shrunk = StrategyLibrary::new();
    shrunk.insert(strategy("Three").saved_as("Three"));
    gateway.save(&shrunk).unwrap();

    let reloaded = gateway.load();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.entries()[0].name(), "Three");
}

#[test]
fn atomic_write_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = gateway_at(dir.path());

    let mut library = StrategyLibrary::new();
    library.insert(strategy("One").saved_as("One"));
    gateway.save(&library).unwrap();

    assert!(dir.path().join("strategies.json").exists());
    assert!(!dir.path().join("strategies.tmp").exists());
}

#[test]
fn blob_store_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::with_dir(dir.path());

    assert!(store.get("strategies").unwrap().is_none());
    store.set("strategies", "[]").unwrap();
    assert_eq!(store.get("strategies").unwrap().as_deref(), Some("[]"));
}
