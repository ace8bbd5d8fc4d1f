//! Collection cycle controller.
//!
//! The `CycleController` owns the entity registry and the chart set of one
//! module instance and drives a cycle end to end: fetch, normalize,
//! synchronize charts, hand back the snapshot.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::charts::ChartSet;
use crate::collector::registry::EntityRegistry;
use crate::collector::sync::{ChartSynchronizer, SyncReport};
use crate::collector::traits::{EntityCharts, Normalized, Snapshot};
use crate::error::CollectError;

/// Timing information for each cycle phase.
///
/// Used for debugging and performance monitoring.
#[derive(Debug, Clone, Default)]
pub struct CycleTiming {
    /// Total cycle time.
    pub total: Duration,
    /// Time spent waiting for the sample source.
    pub fetch: Duration,
    /// Time to turn raw samples into metrics.
    pub normalize: Duration,
    /// Time to create charts for new entities.
    pub sync: Duration,
}

/// Runs collection cycles for one module instance.
#[derive(Debug, Default)]
pub struct CycleController {
    registry: EntityRegistry,
    charts: ChartSet,
    /// Timing information from the last successful cycle.
    last_timing: Option<CycleTiming>,
    /// Synchronization outcome of the last successful cycle.
    last_report: Option<SyncReport>,
    cycles: u64,
}

impl CycleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> &ChartSet {
        &self.charts
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn last_timing(&self) -> Option<&CycleTiming> {
        self.last_timing.as_ref()
    }

    pub fn last_report(&self) -> Option<&SyncReport> {
        self.last_report.as_ref()
    }

    /// Number of cycles that produced a snapshot.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs one cycle.
    ///
    /// `fetch` and `normalize` failures abort the cycle before the registry or
    /// the chart set are touched. Entity-level failures during
    /// synchronization only degrade that entity and are available through
    /// [`last_report`](Self::last_report).
    pub fn run_cycle<R, C, F, N>(
        &mut self,
        catalog: &C,
        fetch: F,
        normalize: N,
    ) -> Result<Snapshot, CollectError>
    where
        C: EntityCharts + ?Sized,
        F: FnOnce() -> Result<R, CollectError>,
        N: FnOnce(R) -> Result<Normalized, CollectError>,
    {
        let total_start = Instant::now();
        let mut timing = CycleTiming::default();

        let start = Instant::now();
        let raw = fetch()?;
        timing.fetch = start.elapsed();

        let start = Instant::now();
        let Normalized { metrics, seen } = normalize(raw)?;
        timing.normalize = start.elapsed();

        let start = Instant::now();
        let report = ChartSynchronizer::new(&mut self.registry, &mut self.charts)
            .sync_all(catalog, &seen, &metrics);
        timing.sync = start.elapsed();

        timing.total = total_start.elapsed();
        self.cycles += 1;

        debug!(
            metrics = metrics.len(),
            charts = self.charts.len(),
            new_entities = report.materialized.len(),
            failed_entities = report.failed.len(),
            "cycle #{} done in {:?}",
            self.cycles,
            timing.total
        );

        self.last_timing = Some(timing);
        self.last_report = Some(report);
        Ok(metrics)
    }
}
