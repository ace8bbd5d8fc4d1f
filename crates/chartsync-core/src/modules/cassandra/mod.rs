//! Cassandra nodes monitored through the Prometheus JMX exporter.
//!
//! One HTTP scrape per cycle. Node-wide charts are created once, each as soon
//! as the beans feeding it are exported; every garbage collector adds its
//! dimensions to the JVM charts.

mod charts;
mod collect;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::charts::ChartSet;
use crate::collector::{CycleController, Module, Snapshot};
use crate::error::{CollectError, ConfigError, TransportError};
use crate::prometheus;
use crate::source::http::parse_url;
use crate::source::{HttpSource, SampleSource};
use crate::util::deserialize_duration;

pub use charts::CassandraCharts;
pub use collect::normalize;

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_update_every() -> Duration {
    Duration::from_secs(5)
}

/// Job configuration of the cassandra module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// JMX exporter endpoint, e.g. `http://127.0.0.1:7072/metrics`.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(default = "default_update_every", deserialize_with = "deserialize_duration")]
    pub update_every: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: default_timeout(),
            update_every: default_update_every(),
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub struct Cassandra {
    config: Config,
    source: Option<Box<dyn SampleSource>>,
    controller: CycleController,
    clock: fn() -> i64,
}

impl Cassandra {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: None,
            controller: CycleController::new(),
            clock: unix_now,
        }
    }

    /// Uses `source` instead of an HTTP client built from `url`.
    pub fn with_source(config: Config, source: impl SampleSource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &CycleController {
        &self.controller
    }
}

impl Module for Cassandra {
    fn name(&self) -> &'static str {
        "cassandra"
    }

    fn init(&mut self) -> Result<(), ConfigError> {
        parse_url(&self.config.url)?;
        if self.source.is_none() {
            let source = HttpSource::new(&self.config.url, self.config.timeout)?;
            self.source = Some(Box::new(source));
        }
        Ok(())
    }

    fn try_collect(&mut self) -> Result<Snapshot, CollectError> {
        let Some(source) = self.source.as_mut() else {
            return Err(TransportError::Request("module is not initialized".into()).into());
        };
        let now = (self.clock)();

        self.controller.run_cycle(
            &CassandraCharts,
            || Ok(source.fetch()?),
            |body| {
                let samples = prometheus::parse_bytes(&body)?;
                Ok(normalize(&samples, now))
            },
        )
    }

    fn charts(&self) -> &ChartSet {
        self.controller.charts()
    }

    fn cleanup(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.close();
        }
    }
}
