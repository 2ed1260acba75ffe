use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the strategy lifecycle core.
///
/// The session maps these onto user-visible outcomes: `Validation` and
/// `Service` abort the action with no state change, `NotFound` is an error
/// for explicit load/delete (history appends on a missing id are a silent
/// no-op and never construct this), `Persistence` is logged and non-fatal.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Invalid service response: missing or malformed field '{field}'")]
    Validation { field: String },

    #[error("Strategy not found: {id}")]
    NotFound { id: Uuid },

    #[error("Persistence failure: {reason}")]
    Persistence { reason: String },

    #[error("Generation service failure: {reason}")]
    Service { reason: String },
}

impl StrategyError {
    pub fn validation(field: impl Into<String>) -> Self {
        StrategyError::Validation {
            field: field.into(),
        }
    }

    pub fn service(reason: impl std::fmt::Display) -> Self {
        StrategyError::Service {
            reason: reason.to_string(),
        }
    }

    pub fn persistence(reason: impl std::fmt::Display) -> Self {
        StrategyError::Persistence {
            reason: reason.to_string(),
        }
    }
}
