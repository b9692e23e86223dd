mod availability;
mod conflict;
mod error;
mod queries;

pub use availability::{evaluate, first_free_window, merge, merge_overlapping, next_available};
pub use conflict::{find_conflicts, has_conflict, live_contracts};
pub use error::EngineError;

use std::sync::Arc;

use chrono::TimeDelta;

use crate::gateway::ContractGateway;
use crate::limits::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Concurrent per-unit gateway fetches within one batch call.
    pub max_concurrency: usize,
    pub max_batch_units: usize,
    pub max_query_window: TimeDelta,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_batch_units: MAX_BATCH_UNITS,
            max_query_window: TimeDelta::days(MAX_QUERY_WINDOW_DAYS),
        }
    }
}

/// Stateless availability engine over a contract gateway.
///
/// Holds no mutable state of its own; any number of callers may share one
/// engine (typically behind an `Arc`) without locking.
pub struct Engine {
    gateway: Arc<dyn ContractGateway>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(gateway: Arc<dyn ContractGateway>) -> Self {
        Self::with_config(gateway, EngineConfig::default())
    }

    pub fn with_config(gateway: Arc<dyn ContractGateway>, config: EngineConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
