//! The per-user session: one owner of the current-artifact slot and the
//! durable library, serialized through the persistence gateway.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::StrategyError;
use crate::domain::library::StrategyLibrary;
use crate::domain::ports::StrategyGenerator;
use crate::domain::ranking::{self, SortDirection, SortKey};
use crate::domain::types::{
    BacktestInput, BacktestRecord, CurrentStrategy, Preferences, SavedStrategy, Strategy,
};
use crate::infrastructure::library_persistence::LibraryGateway;

/// Busy markers for the surface layer, one per generation-service action.
///
/// The surface disables the triggering control while its flag is set; the
/// session itself does not reject overlapping calls (last response wins for
/// the slot it writes).
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingFlags {
    pub generating: bool,
    pub optimizing: bool,
    pub backtesting: bool,
}

pub struct StrategySession {
    generator: Arc<dyn StrategyGenerator>,
    gateway: LibraryGateway,
    current: Option<CurrentStrategy>,
    library: StrategyLibrary,
    flags: PendingFlags,
}

impl StrategySession {
    /// Open a session against the given service and store. A missing or
    /// corrupt stored library starts the session empty rather than failing.
    pub fn open(generator: Arc<dyn StrategyGenerator>, gateway: LibraryGateway) -> Self {
        let library = gateway.load();
        info!("Session opened with {} saved strategies", library.len());
        Self {
            generator,
            gateway,
            current: None,
            library,
            flags: PendingFlags::default(),
        }
    }

    pub fn current(&self) -> Option<&CurrentStrategy> {
        self.current.as_ref()
    }

    pub fn library(&self) -> &StrategyLibrary {
        &self.library
    }

    pub fn flags(&self) -> PendingFlags {
        self.flags
    }

    /// Generate a fresh strategy from user preferences and make it current.
    /// On failure the previous current artifact stays in place.
    pub async fn generate(&mut self, preferences: &Preferences) -> Result<&Strategy> {
        self.flags.generating = true;
        let result = self.generator.generate(preferences).await;
        self.flags.generating = false;

        let generated = result?;
        info!(
            "Generated strategy '{}' ({} {} {})",
            generated.strategy_name,
            preferences.trading_style,
            preferences.market,
            preferences.risk_tolerance
        );
        let slot = self.current.insert(CurrentStrategy::Ephemeral(generated));
        Ok(slot.strategy())
    }

    /// Ask the service for an improved variant of the current strategy.
    ///
    /// The result is a brand-new ephemeral artifact: no id, no save time, no
    /// history, even when the source was durable. The source entry in the
    /// library is untouched. A service failure leaves both the slot and the
    /// collection as they were.
    pub async fn optimize(&mut self) -> Result<&Strategy> {
        let source = match &self.current {
            Some(current) => current.strategy().clone(),
            None => anyhow::bail!("No current strategy to optimize"),
        };

        self.flags.optimizing = true;
        let result = self.generator.optimize(&source).await;
        self.flags.optimizing = false;

        let optimized = result?;
        info!(
            "Optimized '{}' into '{}'",
            source.strategy_name, optimized.strategy_name
        );
        let slot = self.current.insert(CurrentStrategy::Ephemeral(optimized));
        Ok(slot.strategy())
    }

    /// Persist the current artifact under a chosen display name.
    ///
    /// Assigns identity exactly once: if the current strategy is already
    /// durable this is a no-op returning the existing id, never a second
    /// identity or a duplicate library entry.
    pub fn save_current(&mut self, display_name: &str) -> Result<Uuid> {
        let current = match self.current.take() {
            Some(current) => current,
            None => anyhow::bail!("No current strategy to save"),
        };

        match current {
            CurrentStrategy::Durable(saved) => {
                info!("Strategy '{}' is already saved as {}", saved.name(), saved.id);
                let id = saved.id;
                self.current = Some(CurrentStrategy::Durable(saved));
                Ok(id)
            }
            CurrentStrategy::Ephemeral(strategy) => {
                let saved = strategy.saved_as(display_name);
                let id = saved.id;
                info!("Saved strategy '{}' as {}", display_name, id);
                self.library.insert(saved.clone());
                self.current = Some(CurrentStrategy::Durable(saved));
                self.persist();
                Ok(id)
            }
        }
    }

    /// Load a saved strategy into the current slot.
    pub fn load(&mut self, id: Uuid) -> Result<(), StrategyError> {
        let saved = self
            .library
            .get(id)
            .cloned()
            .ok_or(StrategyError::NotFound { id })?;
        info!("Loaded strategy '{}' ({})", saved.name(), id);
        self.current = Some(CurrentStrategy::Durable(saved));
        Ok(())
    }

    /// Delete a saved strategy. Clears the current slot if it held the same
    /// identity.
    pub fn delete(&mut self, id: Uuid) -> Result<(), StrategyError> {
        let removed = self
            .library
            .remove(id)
            .ok_or(StrategyError::NotFound { id })?;
        info!("Deleted strategy '{}' ({})", removed.name(), id);
        if self.current.as_ref().and_then(CurrentStrategy::id) == Some(id) {
            self.current = None;
        }
        self.persist();
        Ok(())
    }

    /// Run one simulation of the current strategy.
    ///
    /// The record is returned either way; it is appended to history (newest
    /// first) only when the current strategy is durable, so runs against an
    /// unsaved artifact are simply not recorded.
    pub async fn run_backtest(&mut self, input: &BacktestInput) -> Result<BacktestRecord> {
        let (script, version) = match &self.current {
            Some(current) => {
                let s = current.strategy();
                (s.pine_script.clone(), s.pine_script_version)
            }
            None => anyhow::bail!("No current strategy to backtest"),
        };

        self.flags.backtesting = true;
        let result = self.generator.run_backtest(&script, version, input).await;
        self.flags.backtesting = false;

        let record = result?;
        info!(
            "Backtest complete for {} on {} ({} trades)",
            input.asset, input.timeframe, record.metrics.total_trades
        );

        // Library and the current view must show the same history.
        let durable_id = match &mut self.current {
            Some(CurrentStrategy::Durable(saved)) => {
                saved.backtest_history.insert(0, record.clone());
                Some(saved.id)
            }
            _ => None,
        };
        if let Some(id) = durable_id {
            self.library.append_backtest(id, record.clone());
            self.persist();
        }
        Ok(record)
    }

    /// Sorted view of the library; pure, recomputed per call.
    pub fn ranked(&self, key: SortKey, direction: SortDirection) -> Vec<SavedStrategy> {
        ranking::rank(self.library.entries(), key, direction)
    }

    /// Mirror the in-memory library to the store, full replace. A write
    /// failure is logged; the in-memory collection stays authoritative for
    /// the session.
    fn persist(&self) {
        if let Err(e) = self.gateway.save(&self.library) {
            warn!("Failed to persist strategy library: {}", e);
        }
    }
}
