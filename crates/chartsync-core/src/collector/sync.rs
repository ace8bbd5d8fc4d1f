//! Chart synchronization: materializes charts for newly seen entities.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::charts::{ChartChange, ChartSet, ChartTemplate};
use crate::collector::registry::{EntityClass, EntityId, EntityLabels, EntityRegistry, SeenSet};
use crate::collector::traits::{EntityCharts, Snapshot};
use crate::error::MaterializeError;

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Entities whose charts were all created by the end of this pass.
    pub materialized: Vec<(EntityClass, EntityId)>,
    /// Entities that got some of their charts and still wait for the inputs
    /// of the rest.
    pub pending: Vec<(EntityClass, EntityId)>,
    /// Entities that stayed unknown, with the reason.
    pub failed: Vec<(EntityClass, EntityId, MaterializeError)>,
}

impl SyncReport {
    pub fn merge(&mut self, other: SyncReport) {
        self.materialized.extend(other.materialized);
        self.pending.extend(other.pending);
        self.failed.extend(other.failed);
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What one entity's materialization achieved.
enum Outcome {
    Complete,
    Pending(usize),
}

/// Reconciles seen entities with the chart set of one module instance.
///
/// Materialized entities are skipped; entities absent from the current cycle
/// are left alone. Pending entities are planned again and get only the
/// charts they do not have yet.
pub struct ChartSynchronizer<'a> {
    registry: &'a mut EntityRegistry,
    charts: &'a mut ChartSet,
}

impl<'a> ChartSynchronizer<'a> {
    pub fn new(registry: &'a mut EntityRegistry, charts: &'a mut ChartSet) -> Self {
        Self { registry, charts }
    }

    /// Synchronizes every class of `seen`, families first. Charts of an
    /// entity carry the labels `seen` holds for it.
    pub fn sync_all<C: EntityCharts + ?Sized>(
        &mut self,
        catalog: &C,
        seen: &SeenSet,
        metrics: &Snapshot,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        for (class, ids) in seen.iter() {
            report.merge(self.sync_class(catalog, class, ids, Some(seen), metrics));
        }
        report
    }

    /// Materializes each id of `ids` that is not yet in the registry.
    ///
    /// A failing entity is reported and skipped; it does not stop its
    /// siblings.
    pub fn sync<C: EntityCharts + ?Sized>(
        &mut self,
        catalog: &C,
        class: EntityClass,
        ids: &BTreeSet<EntityId>,
        metrics: &Snapshot,
    ) -> SyncReport {
        self.sync_class(catalog, class, ids, None, metrics)
    }

    fn sync_class<C: EntityCharts + ?Sized>(
        &mut self,
        catalog: &C,
        class: EntityClass,
        ids: &BTreeSet<EntityId>,
        seen: Option<&SeenSet>,
        metrics: &Snapshot,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        for id in ids {
            if self.registry.is_materialized(class, id) {
                continue;
            }
            let labels = seen.and_then(|s| s.labels(class, id));
            match self.materialize(catalog, class, id, labels, metrics) {
                Ok(Outcome::Complete) => {
                    debug!(%class, %id, "charts created");
                    report.materialized.push((class, id.clone()));
                }
                Ok(Outcome::Pending(deferred)) => {
                    trace!(%class, %id, deferred, "charts wait for their inputs");
                    report.pending.push((class, id.clone()));
                }
                Err(e) => {
                    warn!(%class, %id, "can not create charts: {}", e);
                    report.failed.push((class, id.clone(), e));
                }
            }
        }
        report
    }

    fn materialize<C: EntityCharts + ?Sized>(
        &mut self,
        catalog: &C,
        class: EntityClass,
        id: &EntityId,
        labels: Option<&EntityLabels>,
        metrics: &Snapshot,
    ) -> Result<Outcome, MaterializeError> {
        let mut changes = catalog.plan(class, id, metrics)?;
        if let Some(progress) = self.registry.pending(class, id) {
            changes = changes
                .into_iter()
                .filter_map(|change| progress.remaining(change))
                .collect();
        }

        let mut deferred = 0;
        for change in &changes {
            if let ChartChange::Defer { .. } = change {
                deferred += 1;
            }
            for (chart, key) in change.referenced_ids() {
                if !metrics.contains_key(key) {
                    return Err(MaterializeError::Unbacked {
                        chart: chart.to_string(),
                        id: key.to_string(),
                    });
                }
            }
        }

        let changes: Vec<ChartChange> = changes
            .into_iter()
            .filter(|change| !matches!(change, ChartChange::Defer { .. }))
            .map(|change| match (change, labels) {
                (ChartChange::AddChart(mut chart), Some(labels)) => {
                    chart.labels.extend(labels.clone());
                    ChartChange::AddChart(chart)
                }
                (change, _) => change,
            })
            .collect();

        self.charts.apply(changes.clone())?;
        if deferred == 0 {
            self.registry.mark_materialized(class, id.clone());
            Ok(Outcome::Complete)
        } else {
            self.registry.mark_pending(class, id.clone(), &changes);
            Ok(Outcome::Pending(deferred))
        }
    }
}

/// Instantiates `templates` for one entity.
pub fn add_charts<S: AsRef<str>>(
    templates: &[ChartTemplate],
    parts: &[S],
) -> Result<Vec<ChartChange>, MaterializeError> {
    templates
        .iter()
        .map(|t| Ok(ChartChange::AddChart(t.instantiate(parts)?)))
        .collect()
}

/// Like [`add_charts`], but defers charts that reference a key missing from
/// `metrics`. Used for charts fed by optional inputs: a deferred chart is
/// created in the first cycle that collects all of its inputs.
pub fn add_backed_charts<S: AsRef<str>>(
    templates: &[ChartTemplate],
    parts: &[S],
    metrics: &Snapshot,
) -> Result<Vec<ChartChange>, MaterializeError> {
    let mut changes = Vec::new();
    for t in templates {
        let chart = t.instantiate(parts)?;
        if chart.referenced_ids().all(|key| metrics.contains_key(key)) {
            changes.push(ChartChange::AddChart(chart));
        } else {
            changes.push(ChartChange::Defer { chart_id: chart.id });
        }
    }
    Ok(changes)
}
