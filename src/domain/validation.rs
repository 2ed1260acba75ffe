//! Defensive normalization of generation-service payloads.
//!
//! The service contract is JSON with a declared schema, but the model behind
//! it occasionally drops optional collections or emits an incomplete object.
//! Required fields missing is a [`StrategyError::Validation`]; the optional
//! `parameters` and `logicBreakdown` collections default to empty via serde.

use crate::domain::errors::StrategyError;
use crate::domain::types::{BacktestRecord, Strategy};
use serde_json::Value;
use tracing::warn;

const REQUIRED_STRATEGY_FIELDS: [&str; 10] = [
    "strategyName",
    "description",
    "generationRationale",
    "tradingStyle",
    "market",
    "riskTolerance",
    "pineScriptVersion",
    "pineScript",
    "confidenceScore",
    "backtestHighlights",
];

const REQUIRED_BACKTEST_FIELDS: [&str; 6] = [
    "input",
    "metrics",
    "analysis",
    "chartData",
    "trades",
    "updatedPineScript",
];

fn require_fields(value: &Value, required: &[&str]) -> Result<(), StrategyError> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => return Err(StrategyError::validation("<root>")),
    };
    for field in required {
        if !obj.contains_key(*field) {
            warn!("Service response is missing required field '{}'", field);
            return Err(StrategyError::validation(*field));
        }
    }
    Ok(())
}

/// Normalize a raw service payload into a strategy artifact.
pub fn strategy_from_value(value: Value) -> Result<Strategy, StrategyError> {
    require_fields(&value, &REQUIRED_STRATEGY_FIELDS)?;
    serde_json::from_value(value).map_err(|e| {
        warn!("Failed to decode strategy payload: {}", e);
        StrategyError::validation(e.to_string())
    })
}

/// Normalize a raw service payload into a backtest record.
pub fn backtest_from_value(value: Value) -> Result<BacktestRecord, StrategyError> {
    require_fields(&value, &REQUIRED_BACKTEST_FIELDS)?;
    serde_json::from_value(value).map_err(|e| {
        warn!("Failed to decode backtest payload: {}", e);
        StrategyError::validation(e.to_string())
    })
}
