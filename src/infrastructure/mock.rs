use crate::domain::errors::StrategyError;
use crate::domain::ports::StrategyGenerator;
use crate::domain::types::{
    BacktestAnalysis, BacktestInput, BacktestRecord, LogicStep, LogicStepKind, MetricsSummary,
    OhlcPoint, ParameterValue, Preferences, ScriptVersion, Strategy, TradeMarker, TradeSide,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::info;

/// Deterministic offline stand-in for the generation service. Used by tests
/// and by `MODE=mock` runs so the lifecycle can be exercised without an API
/// key.
#[derive(Clone, Default)]
pub struct MockStrategyService {
    fail: bool,
}

impl MockStrategyService {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A service whose every call fails, for error-path tests.
    pub fn failing() -> Self {
        Self { fail: true }
    }

    fn check_available(&self) -> Result<(), StrategyError> {
        if self.fail {
            return Err(StrategyError::service("mock service configured to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl StrategyGenerator for MockStrategyService {
    async fn generate(&self, preferences: &Preferences) -> Result<Strategy, StrategyError> {
        self.check_available()?;
        info!(
            "Mock generation for {} on {}",
            preferences.trading_style, preferences.market
        );
        Ok(Strategy {
            strategy_name: format!("{} {} Momentum", preferences.market, preferences.trading_style),
            description: format!(
                "EMA crossover with RSI filter tuned for {} {} trading.",
                preferences.risk_tolerance, preferences.market
            ),
            generation_rationale: format!(
                "A {} risk profile on {} favors trend confirmation before entry.",
                preferences.risk_tolerance, preferences.market
            ),
            trading_style: preferences.trading_style,
            market: preferences.market,
            risk_tolerance: preferences.risk_tolerance,
            pine_script_version: preferences.pine_script_version,
            parameters: BTreeMap::from([
                ("fast_ema".to_string(), ParameterValue::Number(9.0)),
                ("slow_ema".to_string(), ParameterValue::Number(21.0)),
                ("rsi_period".to_string(), ParameterValue::Number(14.0)),
            ]),
            pine_script: format!(
                "//@version={}\nstrategy(\"Mock Momentum\", overlay=true)",
                match preferences.pine_script_version {
                    ScriptVersion::V5 => "5",
                    ScriptVersion::V6 => "6",
                }
            ),
            confidence_score: 0.7,
            backtest_highlights: MetricsSummary {
                net_profit: "15.2%".to_string(),
                total_trades: 87,
                win_rate: "52%".to_string(),
                profit_factor: 1.5,
                max_drawdown: "8.3%".to_string(),
            },
            logic_breakdown: vec![
                LogicStep {
                    kind: LogicStepKind::Condition,
                    description: "Fast EMA crosses above slow EMA".to_string(),
                },
                LogicStep {
                    kind: LogicStepKind::Entry,
                    description: "Enter long at next candle open".to_string(),
                },
                LogicStep {
                    kind: LogicStepKind::Exit,
                    description: "Exit when RSI exceeds 70".to_string(),
                },
            ],
        })
    }

    async fn optimize(&self, source: &Strategy) -> Result<Strategy, StrategyError> {
        self.check_available()?;
        info!("Mock optimization of '{}'", source.strategy_name);
        let mut optimized = source.clone();
        optimized.strategy_name = format!("{} v2", source.strategy_name);
        optimized.generation_rationale =
            "Added a 200-period EMA trend filter to cut counter-trend entries.".to_string();
        optimized.confidence_score = (source.confidence_score + 0.05).min(1.0);
        optimized
            .parameters
            .insert("trend_ema".to_string(), ParameterValue::Number(200.0));
        Ok(optimized)
    }

    async fn run_backtest(
        &self,
        pine_script: &str,
        version: ScriptVersion,
        input: &BacktestInput,
    ) -> Result<BacktestRecord, StrategyError> {
        self.check_available()?;
        info!("Mock backtest of {} on {}", input.asset, input.timeframe);
        Ok(BacktestRecord {
            input: input.clone(),
            metrics: MetricsSummary {
                net_profit: "6.8%".to_string(),
                total_trades: 24,
                win_rate: "58%".to_string(),
                profit_factor: 1.7,
                max_drawdown: "4.1%".to_string(),
            },
            analysis: BacktestAnalysis {
                strengths: "Captured the sustained trend legs cleanly.".to_string(),
                weaknesses: "Chopped in the sideways mid-period stretch.".to_string(),
                suggestion: "Add an ADX floor to skip low-trend regimes.".to_string(),
            },
            chart_data: vec![
                OhlcPoint {
                    time: "2026-01-05".to_string(),
                    open: 100.0,
                    high: 104.0,
                    low: 99.0,
                    close: 103.0,
                },
                OhlcPoint {
                    time: "2026-01-06".to_string(),
                    open: 103.0,
                    high: 108.0,
                    low: 102.0,
                    close: 107.0,
                },
            ],
            trades: vec![TradeMarker {
                time: "2026-01-05".to_string(),
                side: TradeSide::Buy,
                price: 100.5,
            }],
            updated_pine_script: format!(
                "// backtest: {} {} ({})\n{}",
                input.asset, input.timeframe, version, pine_script
            ),
        })
    }
}
