use crate::domain::errors::StrategyError;
use crate::domain::types::{BacktestInput, BacktestRecord, Preferences, ScriptVersion, Strategy};
use async_trait::async_trait;

// Need async_trait for async functions in traits
#[async_trait]
pub trait StrategyGenerator: Send + Sync {
    /// Design a brand-new strategy for the given preferences.
    async fn generate(&self, preferences: &Preferences) -> Result<Strategy, StrategyError>;

    /// Produce an improved variant of an existing strategy. The result is
    /// always a fresh ephemeral artifact; callers must not expect any
    /// identity to carry over.
    async fn optimize(&self, source: &Strategy) -> Result<Strategy, StrategyError>;

    /// Simulate one run of the given script against an asset/timeframe.
    async fn run_backtest(
        &self,
        pine_script: &str,
        version: ScriptVersion,
        input: &BacktestInput,
    ) -> Result<BacktestRecord, StrategyError>;
}

/// A durable key-value slot. The library gateway is its only caller.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StrategyError>;
    fn set(&self, key: &str, blob: &str) -> Result<(), StrategyError>;
}
