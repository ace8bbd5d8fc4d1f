//! Chart and dimension definitions handed to the host for rendering.
//!
//! A [`ChartSet`] is owned by one module instance. The chart synchronizer is
//! its only mutator: it adds charts (and dimensions to existing charts) and
//! never removes anything.

pub mod template;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::MaterializeError;

pub use template::{ChartTemplate, DimTemplate, IdTemplate, instantiate_all, sanitize_id};

/// How the host draws a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Area,
    Stacked,
}

/// How the host turns collected values into plotted points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DimAlgorithm {
    Absolute,
    Incremental,
    PercentageOfIncrementalRow,
}

/// A plotted series. `id` is the snapshot key that backs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dim {
    pub id: String,
    pub name: String,
    pub algorithm: DimAlgorithm,
    pub mul: i64,
    pub div: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

/// A chart variable. Backed by a snapshot key like a dimension, but not plotted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Var {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub units: String,
    pub family: String,
    pub context: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub priority: u32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub dims: Vec<Dim>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<Var>,
}

impl Chart {
    pub fn has_dim(&self, id: &str) -> bool {
        self.dims.iter().any(|d| d.id == id)
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Every snapshot key this chart reads: dimension ids, then variable ids.
    pub fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.dims
            .iter()
            .map(|d| d.id.as_str())
            .chain(self.vars.iter().map(|v| v.id.as_str()))
    }
}

/// One planned mutation of a [`ChartSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChartChange {
    /// Add a new chart.
    AddChart(Chart),
    /// Attach dimensions to a chart that already exists in the set.
    AddDims { chart_id: String, dims: Vec<Dim> },
    /// A chart left out because some of its inputs were not collected. The
    /// entity is planned again in later cycles until it is created.
    Defer { chart_id: String },
}

impl ChartChange {
    /// `(chart id, snapshot key)` pairs the change will reference.
    pub fn referenced_ids(&self) -> Vec<(&str, &str)> {
        match self {
            ChartChange::AddChart(chart) => chart
                .referenced_ids()
                .map(|id| (chart.id.as_str(), id))
                .collect(),
            ChartChange::AddDims { chart_id, dims } => dims
                .iter()
                .map(|d| (chart_id.as_str(), d.id.as_str()))
                .collect(),
            ChartChange::Defer { .. } => Vec::new(),
        }
    }
}

/// Insertion-ordered collection of charts with O(1) membership checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    charts: Vec<Chart>,
    index: HashMap<String, usize>,
}

impl ChartSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chart> {
        self.charts.iter()
    }

    pub fn has_chart(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_chart(&self, id: &str) -> Option<&Chart> {
        self.index.get(id).map(|&i| &self.charts[i])
    }

    pub fn add_chart(&mut self, chart: Chart) -> Result<(), MaterializeError> {
        self.apply(vec![ChartChange::AddChart(chart)])
    }

    /// Applies a batch of changes atomically: the whole batch is validated
    /// first and nothing is changed if any part of it is rejected.
    pub fn apply(&mut self, changes: Vec<ChartChange>) -> Result<(), MaterializeError> {
        self.validate(&changes)?;

        for change in changes {
            match change {
                ChartChange::AddChart(chart) => {
                    self.index.insert(chart.id.clone(), self.charts.len());
                    self.charts.push(chart);
                }
                ChartChange::AddDims { chart_id, dims } => {
                    if let Some(&i) = self.index.get(&chart_id) {
                        self.charts[i].dims.extend(dims);
                    }
                }
                ChartChange::Defer { .. } => {}
            }
        }
        Ok(())
    }

    fn validate(&self, changes: &[ChartChange]) -> Result<(), MaterializeError> {
        let mut new_charts: HashSet<&str> = HashSet::new();
        let mut new_dims: HashSet<(&str, &str)> = HashSet::new();

        for change in changes {
            match change {
                ChartChange::AddChart(chart) => {
                    if self.has_chart(&chart.id) || !new_charts.insert(&chart.id) {
                        return Err(MaterializeError::DuplicateChart(chart.id.clone()));
                    }
                    let mut dims = HashSet::new();
                    for dim in &chart.dims {
                        if !dims.insert(dim.id.as_str()) {
                            return Err(MaterializeError::DuplicateDim {
                                chart: chart.id.clone(),
                                dim: dim.id.clone(),
                            });
                        }
                    }
                }
                ChartChange::AddDims { chart_id, dims } => {
                    let existing = self
                        .get_chart(chart_id)
                        .ok_or_else(|| MaterializeError::MissingChart(chart_id.clone()))?;
                    for dim in dims {
                        if existing.has_dim(&dim.id)
                            || !new_dims.insert((chart_id.as_str(), dim.id.as_str()))
                        {
                            return Err(MaterializeError::DuplicateDim {
                                chart: chart_id.clone(),
                                dim: dim.id.clone(),
                            });
                        }
                    }
                }
                ChartChange::Defer { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(id: &str, dims: &[&str]) -> Chart {
        Chart {
            id: id.to_string(),
            title: "Test".to_string(),
            units: "units".to_string(),
            family: "test".to_string(),
            context: "test.chart".to_string(),
            chart_type: ChartType::Line,
            priority: 1,
            labels: BTreeMap::new(),
            dims: dims.iter().map(|d| dim(d)).collect(),
            vars: Vec::new(),
        }
    }

    fn dim(id: &str) -> Dim {
        Dim {
            id: id.to_string(),
            name: id.to_string(),
            algorithm: DimAlgorithm::Absolute,
            mul: 1,
            div: 1,
            hidden: false,
        }
    }

    #[test]
    fn test_add_and_lookup() {
        let mut set = ChartSet::new();
        set.add_chart(chart("a", &["a_1"])).unwrap();

        assert!(set.has_chart("a"));
        assert!(!set.has_chart("b"));
        assert_eq!(set.get_chart("a").unwrap().dims.len(), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_add_duplicate_chart() {
        let mut set = ChartSet::new();
        set.add_chart(chart("a", &[])).unwrap();
        let err = set.add_chart(chart("a", &[])).unwrap_err();
        assert_eq!(err, MaterializeError::DuplicateChart("a".into()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut set = ChartSet::new();
        set.add_chart(chart("taken", &[])).unwrap();
        let before = set.clone();

        let err = set
            .apply(vec![
                ChartChange::AddChart(chart("fresh", &["x"])),
                ChartChange::AddChart(chart("taken", &["y"])),
            ])
            .unwrap_err();

        assert_eq!(err, MaterializeError::DuplicateChart("taken".into()));
        assert_eq!(set, before);
    }

    #[test]
    fn test_add_dims_to_existing_chart() {
        let mut set = ChartSet::new();
        set.add_chart(chart("processes_threads", &[])).unwrap();

        set.apply(vec![ChartChange::AddDims {
            chart_id: "processes_threads".into(),
            dims: vec![dim("process_msedge_threads")],
        }])
        .unwrap();

        let c = set.get_chart("processes_threads").unwrap();
        assert!(c.has_dim("process_msedge_threads"));

        let err = set
            .apply(vec![ChartChange::AddDims {
                chart_id: "processes_threads".into(),
                dims: vec![dim("process_msedge_threads")],
            }])
            .unwrap_err();
        assert!(matches!(err, MaterializeError::DuplicateDim { .. }));
    }

    #[test]
    fn test_add_dims_to_missing_chart() {
        let mut set = ChartSet::new();
        let err = set
            .apply(vec![ChartChange::AddDims {
                chart_id: "nope".into(),
                dims: vec![dim("x")],
            }])
            .unwrap_err();
        assert_eq!(err, MaterializeError::MissingChart("nope".into()));
        assert!(set.is_empty());
    }

    #[test]
    fn test_duplicate_dims_within_chart() {
        let mut set = ChartSet::new();
        let err = set.add_chart(chart("a", &["d", "d"])).unwrap_err();
        assert!(matches!(err, MaterializeError::DuplicateDim { .. }));
    }

    #[test]
    fn test_chart_serializes_host_fields() {
        let c = chart("a", &["a_1"]).with_label("core", "0,0");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "line");
        assert_eq!(json["labels"]["core"], "0,0");
        assert_eq!(json["dims"][0]["algorithm"], "absolute");
        assert!(json.get("vars").is_none());
    }
}
