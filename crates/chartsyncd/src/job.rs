//! Jobs and their scheduling.
//!
//! Every job writes JSON lines to the output:
//!
//! ```text
//! {"job":"win","chart":{"id":"cpu_utilization_total",...}}
//! {"job":"win","chart_id":"processes_cpu_time","dims":[{"id":"process_svchost_cpu_time",...}]}
//! {"job":"win","metrics":{"cpu_core_0_idle":1234,...}}
//! ```
//!
//! Charts are announced once, the first cycle they exist. Dimensions added to
//! an announced chart later are announced on their own.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use chartsync_core::charts::{Chart, Dim};
use chartsync_core::collector::{Module, Snapshot};
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Serialize)]
#[serde(untagged)]
enum Line<'a> {
    Chart {
        job: &'a str,
        chart: &'a Chart,
    },
    Dims {
        job: &'a str,
        chart_id: &'a str,
        dims: &'a [Dim],
    },
    Metrics {
        job: &'a str,
        metrics: BTreeMap<&'a str, i64>,
    },
}

fn write_line<W: Write>(out: &mut W, line: &Line<'_>) -> io::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")
}

/// A named module instance collected every `update_every`.
pub struct Job {
    name: String,
    module: Box<dyn Module>,
    update_every: Duration,
    next_due: Instant,
    /// Chart id to number of dims already written.
    announced: HashMap<String, usize>,
}

impl Job {
    /// Creates a job due at `now`.
    pub fn new(
        name: impl Into<String>,
        module: Box<dyn Module>,
        update_every: Duration,
        now: Instant,
    ) -> Self {
        Self {
            name: name.into(),
            module,
            update_every,
            next_due: now,
            announced: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due <= now
    }

    /// Runs one cycle and writes new charts and the snapshot to `out`.
    ///
    /// Returns whether the cycle produced metrics.
    pub fn run<W: Write>(&mut self, now: Instant, out: &mut W) -> io::Result<bool> {
        self.next_due += self.update_every;
        if self.next_due <= now {
            // Missed ticks are skipped, not replayed.
            self.next_due = now + self.update_every;
        }

        let snapshot = self.module.collect();
        self.announce(out)?;
        let Some(mx) = snapshot else {
            debug!(job = %self.name, "no metrics collected");
            return Ok(false);
        };
        self.write_metrics(&mx, out)?;
        Ok(true)
    }

    fn announce<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        for chart in self.module.charts().iter() {
            match self.announced.get(&chart.id).copied() {
                None => {
                    write_line(
                        out,
                        &Line::Chart {
                            job: &self.name,
                            chart,
                        },
                    )?;
                }
                Some(written) if written < chart.dims.len() => {
                    write_line(
                        out,
                        &Line::Dims {
                            job: &self.name,
                            chart_id: &chart.id,
                            dims: &chart.dims[written..],
                        },
                    )?;
                }
                Some(_) => continue,
            }
            self.announced.insert(chart.id.clone(), chart.dims.len());
        }
        Ok(())
    }

    fn write_metrics<W: Write>(&self, mx: &Snapshot, out: &mut W) -> io::Result<()> {
        let metrics = mx.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        write_line(
            out,
            &Line::Metrics {
                job: &self.name,
                metrics,
            },
        )?;
        out.flush()
    }
}

/// Runs initialized jobs on a single thread in due order.
#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<Job>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the module of `job` and checks that it collects.
    /// Jobs failing either step are dropped.
    pub fn start(&mut self, mut job: Job) -> bool {
        if let Err(e) = job.module.init() {
            error!(job = %job.name, module = job.module.name(), "init failed: {}", e);
            return false;
        }
        if !job.module.check() {
            error!(
                job = %job.name,
                module = job.module.name(),
                "check failed, job is not started"
            );
            job.module.cleanup();
            return false;
        }
        info!(
            job = %job.name,
            module = job.module.name(),
            "started, collecting every {:?}",
            job.update_every
        );
        self.jobs.push(job);
        true
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Earliest due time over all jobs.
    pub fn next_due(&self) -> Option<Instant> {
        self.jobs.iter().map(Job::next_due).min()
    }

    /// Runs every job due at `now`. Returns the number of jobs run.
    pub fn run_due<W: Write>(&mut self, now: Instant, out: &mut W) -> io::Result<usize> {
        let mut ran = 0;
        for job in self.jobs.iter_mut().filter(|j| j.is_due(now)) {
            job.run(now, out)?;
            ran += 1;
        }
        Ok(ran)
    }

    pub fn cleanup(&mut self) {
        for job in &mut self.jobs {
            debug!(job = %job.name(), "cleanup");
            job.module.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use chartsync_core::charts::{ChartChange, ChartSet, ChartType, DimAlgorithm};
    use chartsync_core::error::{CollectError, ConfigError};
    use serde_json::Value;

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

    fn chart(id: &str, dims: &[&str]) -> Chart {
        Chart {
            id: id.to_string(),
            title: "Test".to_string(),
            units: "n".to_string(),
            family: "test".to_string(),
            context: format!("test.{}", id),
            chart_type: ChartType::Line,
            priority: 1,
            labels: BTreeMap::new(),
            dims: dims.iter().map(|d| dim(d)).collect(),
            vars: Vec::new(),
        }
    }

    /// Each cycle pops the next scripted step: the dims of chart `c`, or an
    /// error.
    struct ScriptedModule {
        steps: Vec<Option<Vec<&'static str>>>,
        charts: ChartSet,
        init_ok: bool,
        cleanups: Arc<Mutex<usize>>,
    }

    impl ScriptedModule {
        fn new(steps: Vec<Option<Vec<&'static str>>>) -> Self {
            Self {
                steps,
                charts: ChartSet::new(),
                init_ok: true,
                cleanups: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl Module for ScriptedModule {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn init(&mut self) -> Result<(), ConfigError> {
            if self.init_ok {
                Ok(())
            } else {
                Err(ConfigError::Empty("url"))
            }
        }

        fn try_collect(&mut self) -> Result<Snapshot, CollectError> {
            let step = if self.steps.is_empty() {
                None
            } else {
                self.steps.remove(0)
            };
            let Some(dims) = step else {
                return Err(CollectError::bad_payload("scripted failure"));
            };
            let wanted = chart("c", &dims);
            if let Some(have) = self.charts.get_chart("c") {
                let dims: Vec<Dim> = wanted
                    .dims
                    .iter()
                    .filter(|d| !have.has_dim(&d.id))
                    .cloned()
                    .collect();
                if !dims.is_empty() {
                    let change = ChartChange::AddDims {
                        chart_id: "c".to_string(),
                        dims,
                    };
                    self.charts
                        .apply(vec![change])
                        .map_err(|e| CollectError::bad_payload(e.to_string()))?;
                }
            } else {
                self.charts
                    .add_chart(wanted)
                    .map_err(|e| CollectError::bad_payload(e.to_string()))?;
            }
            Ok(dims.iter().map(|d| (d.to_string(), 1)).collect())
        }

        fn charts(&self) -> &ChartSet {
            &self.charts
        }

        fn cleanup(&mut self) {
            *self.cleanups.lock().unwrap() += 1;
        }
    }

    fn lines(out: &[u8]) -> Vec<Value> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_run_announces_charts_once() {
        let now = Instant::now();
        let module = ScriptedModule::new(vec![Some(vec!["a"]), Some(vec!["a"]), Some(vec!["a", "b"])]);
        let mut job = Job::new("j1", Box::new(module), Duration::from_secs(1), now);

        let mut out = Vec::new();
        assert!(job.run(now, &mut out).unwrap());
        let got = lines(&out);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0]["job"], "j1");
        assert_eq!(got[0]["chart"]["id"], "c");
        assert_eq!(got[1]["metrics"]["a"], 1);

        let mut out = Vec::new();
        assert!(job.run(now, &mut out).unwrap());
        let got = lines(&out);
        assert_eq!(got.len(), 1);
        assert!(got[0].get("metrics").is_some());

        let mut out = Vec::new();
        assert!(job.run(now, &mut out).unwrap());
        let got = lines(&out);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0]["chart_id"], "c");
        assert_eq!(got[0]["dims"].as_array().unwrap().len(), 1);
        assert_eq!(got[0]["dims"][0]["id"], "b");
        assert_eq!(got[1]["metrics"]["b"], 1);
    }

    #[test]
    fn test_failed_cycle_writes_nothing() {
        let now = Instant::now();
        let module = ScriptedModule::new(vec![None]);
        let mut job = Job::new("j1", Box::new(module), Duration::from_secs(1), now);

        let mut out = Vec::new();
        assert!(!job.run(now, &mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_advances_due_time() {
        let start = Instant::now();
        let every = Duration::from_secs(5);
        let mut job = Job::new("j1", Box::new(ScriptedModule::new(vec![])), every, start);
        assert!(job.is_due(start));

        job.run(start, &mut Vec::new()).unwrap();
        assert_eq!(job.next_due(), start + every);
        assert!(!job.is_due(start + Duration::from_secs(1)));

        // Far behind schedule: the next tick is one interval from now.
        let late = start + Duration::from_secs(60);
        job.run(late, &mut Vec::new()).unwrap();
        assert_eq!(job.next_due(), late + every);
    }

    #[test]
    fn test_scheduler_start_and_run_due() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();

        let mut broken = ScriptedModule::new(vec![Some(vec!["a"])]);
        broken.init_ok = false;
        assert!(!scheduler.start(Job::new("broken", Box::new(broken), Duration::from_secs(1), now)));

        let failing = ScriptedModule::new(vec![None]);
        let failing_cleanups = failing.cleanups.clone();
        assert!(!scheduler.start(Job::new("failing", Box::new(failing), Duration::from_secs(1), now)));
        assert_eq!(*failing_cleanups.lock().unwrap(), 1);

        let fast = ScriptedModule::new(vec![Some(vec!["a"]); 3]);
        let slow = ScriptedModule::new(vec![Some(vec!["a"]); 3]);
        let cleanups = slow.cleanups.clone();
        assert!(scheduler.start(Job::new("fast", Box::new(fast), Duration::from_secs(1), now)));
        assert!(scheduler.start(Job::new("slow", Box::new(slow), Duration::from_secs(10), now)));
        assert_eq!(scheduler.len(), 2);

        let mut out = Vec::new();
        assert_eq!(scheduler.run_due(now, &mut out).unwrap(), 2);
        // The charts were created by the check cycle and are written with the
        // first scheduled one.
        let got = lines(&out);
        assert_eq!(got.len(), 4);
        assert_eq!(got[0]["job"], "fast");
        assert_eq!(got[0]["chart"]["id"], "c");
        assert_eq!(got[2]["job"], "slow");

        assert_eq!(scheduler.next_due(), Some(now + Duration::from_secs(1)));
        let later = now + Duration::from_secs(1);
        let mut out = Vec::new();
        assert_eq!(scheduler.run_due(later, &mut out).unwrap(), 1);
        assert_eq!(lines(&out)[0]["job"], "fast");

        scheduler.cleanup();
        assert_eq!(*cleanups.lock().unwrap(), 1);
    }
}
