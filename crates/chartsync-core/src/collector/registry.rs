//! Entity classes, entity ids and the per-module registry of entities whose
//! charts already exist.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::charts::ChartChange;

/// Category of dynamically discovered sub-resource.
///
/// The declaration order is the synchronization order: `Family` goes first so
/// that fixed charts exist before per-entity dimensions are attached to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    /// A sub-collector whose fixed charts are created once, on first sight.
    Family,
    /// A sub-collector's own status and duration.
    Collector,
    Core,
    Volume,
    Nic,
    ThermalZone,
    Process,
    Service,
    Website,
    CertTemplate,
    MssqlInstance,
    /// `(instance, database)` pair.
    MssqlDatabase,
    Gpu,
    Peer,
    /// A JVM garbage collector.
    GarbageCollector,
}

impl EntityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Family => "family",
            EntityClass::Collector => "collector",
            EntityClass::Core => "core",
            EntityClass::Volume => "volume",
            EntityClass::Nic => "nic",
            EntityClass::ThermalZone => "thermal_zone",
            EntityClass::Process => "process",
            EntityClass::Service => "service",
            EntityClass::Website => "website",
            EntityClass::CertTemplate => "cert_template",
            EntityClass::MssqlInstance => "mssql_instance",
            EntityClass::MssqlDatabase => "mssql_database",
            EntityClass::Gpu => "gpu",
            EntityClass::Peer => "peer",
            EntityClass::GarbageCollector => "garbage_collector",
        }
    }

    /// Number of components an id of this class has.
    pub fn arity(&self) -> usize {
        match self {
            EntityClass::MssqlDatabase => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one entity within its class.
///
/// Composite ids keep their components separate, so a component that itself
/// contains `:` can never be confused with the separator. `:` is used only by
/// the `Display` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Vec<String>);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(vec![id.into()])
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self(vec![first.into(), second.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(":"))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Labels attached to every chart created for one entity.
pub type EntityLabels = BTreeMap<String, String>;

/// Entities encountered by the normalizer during one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenSet {
    classes: BTreeMap<EntityClass, BTreeSet<EntityId>>,
    labels: BTreeMap<(EntityClass, EntityId), EntityLabels>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: EntityClass, id: EntityId) {
        debug_assert_eq!(id.parts().len(), class.arity(), "{class} id {id}");
        self.classes.entry(class).or_default().insert(id);
    }

    pub fn contains(&self, class: EntityClass, id: &EntityId) -> bool {
        self.classes.get(&class).is_some_and(|ids| ids.contains(id))
    }

    /// Sets a chart label for `id`. Labels of an entity seen in several
    /// cycles are taken from the cycle that creates each chart.
    pub fn label(
        &mut self,
        class: EntityClass,
        id: EntityId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.labels
            .entry((class, id))
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn labels(&self, class: EntityClass, id: &EntityId) -> Option<&EntityLabels> {
        self.labels.get(&(class, id.clone()))
    }

    pub fn get(&self, class: EntityClass) -> Option<&BTreeSet<EntityId>> {
        self.classes.get(&class)
    }

    /// Classes in synchronization order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityClass, &BTreeSet<EntityId>)> {
        self.classes.iter().map(|(class, ids)| (*class, ids))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Charts and dimensions already created for an entity whose plan deferred
/// some of its charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    charts: BTreeSet<String>,
    dims: BTreeSet<(String, String)>,
}

impl Progress {
    pub fn has_chart(&self, id: &str) -> bool {
        self.charts.contains(id)
    }

    pub fn has_dim(&self, chart_id: &str, dim_id: &str) -> bool {
        self.dims.contains(&(chart_id.to_string(), dim_id.to_string()))
    }

    /// Drops the parts of `change` that were already applied. Returns `None`
    /// when nothing is left.
    pub(crate) fn remaining(&self, change: ChartChange) -> Option<ChartChange> {
        match change {
            ChartChange::AddChart(chart) if self.has_chart(&chart.id) => None,
            ChartChange::AddDims { chart_id, dims } => {
                let dims: Vec<_> = dims
                    .into_iter()
                    .filter(|d| !self.has_dim(&chart_id, &d.id))
                    .collect();
                (!dims.is_empty()).then_some(ChartChange::AddDims { chart_id, dims })
            }
            other => Some(other),
        }
    }

    pub(crate) fn record(&mut self, changes: &[ChartChange]) {
        for change in changes {
            match change {
                ChartChange::AddChart(chart) => {
                    self.charts.insert(chart.id.clone());
                }
                ChartChange::AddDims { chart_id, dims } => {
                    for d in dims {
                        self.dims.insert((chart_id.clone(), d.id.clone()));
                    }
                }
                ChartChange::Defer { .. } => {}
            }
        }
    }
}

/// Append-only record of materialized entities.
///
/// An id is added only after all of its charts were created, and is never
/// removed for the lifetime of the module instance. An entity whose plan
/// deferred charts with missing inputs is pending until those charts exist
/// too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRegistry {
    classes: BTreeMap<EntityClass, BTreeSet<EntityId>>,
    pending: BTreeMap<(EntityClass, EntityId), Progress>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_materialized(&self, class: EntityClass, id: &EntityId) -> bool {
        self.classes.get(&class).is_some_and(|ids| ids.contains(id))
    }

    pub(crate) fn mark_materialized(&mut self, class: EntityClass, id: EntityId) {
        self.pending.remove(&(class, id.clone()));
        self.classes.entry(class).or_default().insert(id);
    }

    /// Progress of an entity that still has deferred charts.
    pub fn pending(&self, class: EntityClass, id: &EntityId) -> Option<&Progress> {
        self.pending.get(&(class, id.clone()))
    }

    /// Records the changes applied for an entity that still has deferred charts.
    pub(crate) fn mark_pending(&mut self, class: EntityClass, id: EntityId, applied: &[ChartChange]) {
        self.pending.entry((class, id)).or_default().record(applied);
    }

    /// Materialized ids of one class, in stable order.
    pub fn ids(&self, class: EntityClass) -> impl Iterator<Item = &EntityId> {
        self.classes.get(&class).into_iter().flatten()
    }

    /// Total number of materialized entities across classes.
    pub fn len(&self) -> usize {
        self.classes.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartTemplate, ChartType, DimTemplate, IdTemplate};

    #[test]
    fn test_pair_ids_with_separator_do_not_collide() {
        // "a:b" + "c" and "a" + "b:c" share a display form but are distinct keys
        let left = EntityId::pair("a:b", "c");
        let right = EntityId::pair("a", "b:c");

        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);

        let mut seen = SeenSet::new();
        seen.insert(EntityClass::MssqlDatabase, left.clone());
        seen.insert(EntityClass::MssqlDatabase, right.clone());
        assert_eq!(seen.get(EntityClass::MssqlDatabase).unwrap().len(), 2);
    }

    #[test]
    fn test_seen_set_iterates_family_first() {
        let mut seen = SeenSet::new();
        seen.insert(EntityClass::Process, "msedge".into());
        seen.insert(EntityClass::Core, "0,0".into());
        seen.insert(EntityClass::Family, "process".into());

        let order: Vec<EntityClass> = seen.iter().map(|(c, _)| c).collect();
        assert_eq!(
            order,
            vec![EntityClass::Family, EntityClass::Core, EntityClass::Process]
        );
    }

    #[test]
    fn test_registry_membership() {
        let mut registry = EntityRegistry::new();
        assert!(registry.is_empty());

        registry.mark_materialized(EntityClass::Volume, "C:".into());
        registry.mark_materialized(EntityClass::Volume, "C:".into());

        assert!(registry.is_materialized(EntityClass::Volume, &"C:".into()));
        assert!(!registry.is_materialized(EntityClass::Nic, &"C:".into()));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.ids(EntityClass::Volume).collect::<Vec<_>>(),
            vec![&EntityId::new("C:")]
        );
    }

    #[test]
    fn test_pending_entity_completes() {
        let mut registry = EntityRegistry::new();
        let chart = ChartTemplate {
            id: IdTemplate::fixed("memory_page_faults"),
            title: "Page faults",
            units: "events/s",
            family: "memory",
            context: "test.page_faults",
            chart_type: ChartType::Line,
            priority: 1,
            dims: const { &[DimTemplate::incremental(IdTemplate::fixed("memory_page_faults_total"), "faults")] },
            vars: &[],
        }
        .instantiate::<&str>(&[])
        .unwrap();
        let memory = EntityId::new("memory");

        registry.mark_pending(EntityClass::Family, memory.clone(), &[ChartChange::AddChart(chart.clone())]);
        assert!(!registry.is_materialized(EntityClass::Family, &memory));
        assert!(!registry.is_empty());
        let progress = registry.pending(EntityClass::Family, &memory).unwrap();
        assert!(progress.has_chart("memory_page_faults"));
        assert_eq!(progress.remaining(ChartChange::AddChart(chart)), None);

        registry.mark_materialized(EntityClass::Family, memory.clone());
        assert!(registry.is_materialized(EntityClass::Family, &memory));
        assert!(registry.pending(EntityClass::Family, &memory).is_none());
    }

    #[test]
    fn test_seen_set_labels() {
        let mut seen = SeenSet::new();
        let gpu = EntityId::new("GPU-1");
        seen.insert(EntityClass::Gpu, gpu.clone());
        seen.label(EntityClass::Gpu, gpu.clone(), "product_name", "Tesla T4");

        assert_eq!(seen.labels(EntityClass::Gpu, &gpu).unwrap()["product_name"], "Tesla T4");
        assert!(seen.labels(EntityClass::Peer, &gpu).is_none());
    }
}
