use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Timeframes offered to the user when configuring a backtest run.
pub const BACKTEST_TIMEFRAMES: [&str; 13] = [
    "1m", "3m", "5m", "15m", "30m", "45m", "1h", "2h", "3h", "4h", "1d", "1W", "1M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingStyle {
    DayTrading,
    SwingTrading,
    Scalping,
    PositionTrading,
    #[serde(rename = "HFT")]
    Hft,
}

impl fmt::Display for TradingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingStyle::DayTrading => write!(f, "DayTrading"),
            TradingStyle::SwingTrading => write!(f, "SwingTrading"),
            TradingStyle::Scalping => write!(f, "Scalping"),
            TradingStyle::PositionTrading => write!(f, "PositionTrading"),
            TradingStyle::Hft => write!(f, "HFT"),
        }
    }
}

impl std::str::FromStr for TradingStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daytrading" => Ok(TradingStyle::DayTrading),
            "swingtrading" => Ok(TradingStyle::SwingTrading),
            "scalping" => Ok(TradingStyle::Scalping),
            "positiontrading" => Ok(TradingStyle::PositionTrading),
            "hft" => Ok(TradingStyle::Hft),
            _ => anyhow::bail!(
                "Invalid trading style: {}. Must be one of DayTrading, SwingTrading, Scalping, PositionTrading, HFT",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    Crypto,
    Stocks,
    Forex,
    Commodities,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crypto" => Ok(Market::Crypto),
            "stocks" => Ok(Market::Stocks),
            "forex" => Ok(Market::Forex),
            "commodities" => Ok(Market::Commodities),
            _ => anyhow::bail!(
                "Invalid market: {}. Must be one of Crypto, Stocks, Forex, Commodities",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
    Aggressive,
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for RiskTolerance {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskTolerance::Low),
            "medium" => Ok(RiskTolerance::Medium),
            "high" => Ok(RiskTolerance::High),
            "aggressive" => Ok(RiskTolerance::Aggressive),
            _ => anyhow::bail!(
                "Invalid risk tolerance: {}. Must be one of Low, Medium, High, Aggressive",
                s
            ),
        }
    }
}

/// Pine Script dialect the generated code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptVersion {
    V5,
    V6,
}

impl fmt::Display for ScriptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptVersion::V5 => write!(f, "v5"),
            ScriptVersion::V6 => write!(f, "v6"),
        }
    }
}

impl std::str::FromStr for ScriptVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v5" => Ok(ScriptVersion::V5),
            "v6" => Ok(ScriptVersion::V6),
            _ => anyhow::bail!("Invalid script version: {}. Must be 'v5' or 'v6'", s),
        }
    }
}

/// User-chosen generation preferences. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub trading_style: TradingStyle,
    pub market: Market,
    pub risk_tolerance: RiskTolerance,
    pub capital: f64,
    pub pine_script_version: ScriptVersion,
}

/// A named strategy parameter as the service emits it: either a number or
/// free text. Preserved verbatim, never computed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(n) => write!(f, "{}", n),
            ParameterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Headline performance figures as reported by the generation service.
/// Percentage fields are opaque strings ("42.5%"); the crate stores them
/// verbatim and only parses them for the ranking view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub net_profit: String,
    pub total_trades: u32,
    pub win_rate: String,
    pub profit_factor: f64,
    pub max_drawdown: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicStepKind {
    Condition,
    Action,
    Entry,
    Exit,
}

impl fmt::Display for LogicStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicStepKind::Condition => write!(f, "condition"),
            LogicStepKind::Action => write!(f, "action"),
            LogicStepKind::Entry => write!(f, "entry"),
            LogicStepKind::Exit => write!(f, "exit"),
        }
    }
}

/// One step of the strategy's decision flow, for visualization surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicStep {
    #[serde(rename = "type")]
    pub kind: LogicStepKind,
    pub description: String,
}

/// An ephemeral strategy artifact as produced by generation or optimization.
///
/// Carries no identity and no history by construction; it only becomes
/// addressable through [`Strategy::saved_as`]. Service payloads that include
/// identity-like fields lose them here, since deserialization into this type
/// drops unknown keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub strategy_name: String,
    pub description: String,
    pub generation_rationale: String,
    pub trading_style: TradingStyle,
    pub market: Market,
    pub risk_tolerance: RiskTolerance,
    pub pine_script_version: ScriptVersion,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    pub pine_script: String,
    pub confidence_score: f64,
    pub backtest_highlights: MetricsSummary,
    #[serde(default)]
    pub logic_breakdown: Vec<LogicStep>,
}

impl Strategy {
    /// The save transition: mint a fresh identity and an empty history.
    ///
    /// `display_name` overrides the generated name; every other field passes
    /// through unchanged. The returned record is the only form that may enter
    /// the library.
    pub fn saved_as(self, display_name: impl Into<String>) -> SavedStrategy {
        SavedStrategy {
            strategy: Strategy {
                strategy_name: display_name.into(),
                ..self
            },
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            backtest_history: Vec::new(),
        }
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestInput {
    pub asset: String,
    pub timeframe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Qualitative read on one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestAnalysis {
    pub strengths: String,
    pub weaknesses: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// An executed trade to plot against the OHLC series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub time: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub price: f64,
}

/// Result of one simulation run. Append-only once attached to a
/// [`SavedStrategy`]; records are never edited or removed individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRecord {
    pub input: BacktestInput,
    pub metrics: MetricsSummary,
    pub analysis: BacktestAnalysis,
    pub chart_data: Vec<OhlcPoint>,
    pub trades: Vec<TradeMarker>,
    pub updated_pine_script: String,
}

/// A persisted strategy: an artifact plus identity, save time, and its
/// accumulated backtest history, newest first.
///
/// The id is assigned exactly once at save time and is the sole key for
/// lookup, update, and deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStrategy {
    #[serde(flatten)]
    pub strategy: Strategy,
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub backtest_history: Vec<BacktestRecord>,
}

impl SavedStrategy {
    pub fn name(&self) -> &str {
        &self.strategy.strategy_name
    }
}

/// What the "current artifact" slot holds: either a fresh, unsaved artifact
/// or a strategy loaded from the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CurrentStrategy {
    Ephemeral(Strategy),
    Durable(SavedStrategy),
}

impl CurrentStrategy {
    pub fn strategy(&self) -> &Strategy {
        match self {
            CurrentStrategy::Ephemeral(s) => s,
            CurrentStrategy::Durable(s) => &s.strategy,
        }
    }

    /// The durable identity, if this slot holds a saved strategy.
    pub fn id(&self) -> Option<Uuid> {
        match self {
            CurrentStrategy::Ephemeral(_) => None,
            CurrentStrategy::Durable(s) => Some(s.id),
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, CurrentStrategy::Durable(_))
    }
}
