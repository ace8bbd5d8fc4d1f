//! Seams between the engine and the collector modules.

use std::collections::HashMap;

use tracing::error;

use crate::charts::{ChartChange, ChartSet};
use crate::collector::registry::{EntityClass, EntityId, SeenSet};
use crate::error::{CollectError, ConfigError, MaterializeError};

/// Result of one cycle: stable metric id to integer value.
pub type Snapshot = HashMap<String, i64>;

/// Output of a normalizer: the metrics and the entities they mention.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub metrics: Snapshot,
    pub seen: SeenSet,
}

impl Normalized {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.metrics.insert(key.into(), value);
    }

    /// Adds to the current value (missing keys start at zero).
    pub fn add(&mut self, key: impl Into<String>, value: i64) {
        *self.metrics.entry(key.into()).or_insert(0) += value;
    }

    pub fn see(&mut self, class: EntityClass, id: EntityId) {
        self.seen.insert(class, id);
    }

    /// Labels every chart created for `id`.
    pub fn label(
        &mut self,
        class: EntityClass,
        id: EntityId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.seen.label(class, id, key, value);
    }
}

/// Module-specific knowledge of which charts an entity gets.
///
/// Implementations match exhaustively on the classes they own and return
/// [`MaterializeError::UnsupportedClass`] for the rest.
pub trait EntityCharts {
    /// Plans the chart changes that materialize `id`. `metrics` is the
    /// snapshot of the current cycle, for templates that only apply when their
    /// inputs were collected.
    fn plan(
        &self,
        class: EntityClass,
        id: &EntityId,
        metrics: &Snapshot,
    ) -> Result<Vec<ChartChange>, MaterializeError>;
}

/// A collector module as seen by the host.
pub trait Module {
    /// Short module name used in logs and job files.
    fn name(&self) -> &'static str;

    /// Validates configuration and prepares clients.
    fn init(&mut self) -> Result<(), ConfigError>;

    /// Runs one cycle, reporting why it failed.
    fn try_collect(&mut self) -> Result<Snapshot, CollectError>;

    /// Charts created so far.
    fn charts(&self) -> &ChartSet;

    /// Runs one cycle. Failed and empty cycles both yield `None`.
    fn collect(&mut self) -> Option<Snapshot> {
        match self.try_collect() {
            Ok(mx) if !mx.is_empty() => Some(mx),
            Ok(_) => None,
            Err(e) => {
                error!(module = self.name(), "{}", e);
                None
            }
        }
    }

    /// Health predicate: a cycle produced a non-empty snapshot.
    fn check(&mut self) -> bool {
        self.collect().is_some()
    }

    /// Releases connections. Safe to call more than once.
    fn cleanup(&mut self) {}
}
