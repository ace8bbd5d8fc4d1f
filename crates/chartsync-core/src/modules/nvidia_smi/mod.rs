//! NVIDIA GPUs monitored through the `nvidia-smi` binary.
//!
//! In CSV mode the properties to query are discovered once from
//! `--help-query-gpu`, so drivers that lack some of them still work. In XML
//! mode the full `-q -x` report is decoded.

mod charts;
mod collect;
mod exec;

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::charts::ChartSet;
use crate::collector::{CycleController, Module, Snapshot};
use crate::error::{CollectError, ConfigError, TransportError};
use crate::util::deserialize_duration;

pub use charts::GpuCharts;
pub use collect::{GpuInfo, QUERY_PROPERTIES, discover_properties, normalize, parse_csv, parse_xml};
pub use exec::{ExecSmi, SmiExec, look_path};

const BIN_NAME: &str = "nvidia-smi";

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_use_csv_format() -> bool {
    true
}

fn default_update_every() -> Duration {
    Duration::from_secs(10)
}

/// Job configuration of the nvidia_smi module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Looked up in `PATH` when empty.
    #[serde(default)]
    pub binary_path: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(default = "default_use_csv_format")]
    pub use_csv_format: bool,
    #[serde(default = "default_update_every", deserialize_with = "deserialize_duration")]
    pub update_every: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binary_path: String::new(),
            timeout: default_timeout(),
            use_csv_format: default_use_csv_format(),
            update_every: default_update_every(),
        }
    }
}

pub struct NvidiaSmi {
    config: Config,
    exec: Option<Box<dyn SmiExec>>,
    controller: CycleController,
    /// CSV query properties, discovered on the first CSV cycle.
    properties: Option<Vec<String>>,
}

impl NvidiaSmi {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            exec: None,
            controller: CycleController::new(),
            properties: None,
        }
    }

    /// Uses `exec` instead of running the binary.
    pub fn with_exec(config: Config, exec: impl SmiExec + 'static) -> Self {
        Self {
            exec: Some(Box::new(exec)),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &CycleController {
        &self.controller
    }

    fn init_exec(&self) -> Result<ExecSmi, ConfigError> {
        let path = if self.config.binary_path.is_empty() {
            look_path(BIN_NAME)?
        } else {
            let path = Path::new(&self.config.binary_path);
            if !path.is_file() {
                return Err(ConfigError::BinaryNotFound(self.config.binary_path.clone()));
            }
            path.to_path_buf()
        };
        debug!(path = %path.display(), "using nvidia-smi binary");
        Ok(ExecSmi::new(path, self.config.timeout))
    }
}

impl Module for NvidiaSmi {
    fn name(&self) -> &'static str {
        "nvidia_smi"
    }

    fn init(&mut self) -> Result<(), ConfigError> {
        if self.exec.is_none() {
            let exec = self.init_exec()?;
            self.exec = Some(Box::new(exec));
        }
        Ok(())
    }

    fn try_collect(&mut self) -> Result<Snapshot, CollectError> {
        let Some(exec) = self.exec.as_mut() else {
            return Err(TransportError::Request("module is not initialized".into()).into());
        };

        if !self.config.use_csv_format {
            return self.controller.run_cycle(
                &GpuCharts,
                || Ok(exec.query_gpu_info_xml()?),
                |out| Ok(normalize(&parse_xml(&out)?)),
            );
        }

        let properties = match self.properties.take() {
            Some(properties) => properties,
            None => {
                let properties = discover_properties(&exec.query_help_query_gpu()?)?;
                debug!(?properties, "discovered query properties");
                properties
            }
        };
        let result = self.controller.run_cycle(
            &GpuCharts,
            || Ok(exec.query_gpu_info_csv(&properties)?),
            |out| Ok(normalize(&parse_csv(&out)?)),
        );
        self.properties = Some(properties);
        result
    }

    fn charts(&self) -> &ChartSet {
        self.controller.charts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;

    const HELP_QUERY_GPU: &str = include_str!("../../../testdata/nvidia_smi/help-query-gpu.txt");
    const QUERY_GPU_CSV: &str = include_str!("../../../testdata/nvidia_smi/query-gpu.csv");
    const QUERY_GPU_XML: &str = include_str!("../../../testdata/nvidia_smi/query-gpu.xml");

    const RTX: &str = "GPU-27b94a00-ed54-5c24-b1fd-1054085de32a";
    const TESLA: &str = "GPU-9b2ac5f1-8a1c-3c5e-0f7d-2e1b4f6a7c80";
    const GTX: &str = "GPU-f4d1a2b3-6a3e-4f0e-9b9c-5d6e7f809a1b";

    #[derive(Debug, Default)]
    struct Calls {
        help: usize,
        csv: Vec<Vec<String>>,
        xml: usize,
    }

    /// Canned `nvidia-smi` output; `None` makes the query fail.
    #[derive(Clone, Default)]
    struct MockSmi {
        help: Option<&'static str>,
        csv: Option<&'static str>,
        xml: Option<&'static str>,
        calls: Arc<Mutex<Calls>>,
    }

    fn output(out: Option<&'static str>) -> Result<Vec<u8>, TransportError> {
        out.map(|s| s.as_bytes().to_vec()).ok_or_else(|| TransportError::Exec {
            command: BIN_NAME.into(),
            reason: "exited with exit status: 9".into(),
        })
    }

    impl SmiExec for MockSmi {
        fn query_gpu_info_xml(&mut self) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().xml += 1;
            output(self.xml)
        }

        fn query_gpu_info_csv(&mut self, properties: &[String]) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().csv.push(properties.to_vec());
            output(self.csv)
        }

        fn query_help_query_gpu(&mut self) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().help += 1;
            output(self.help)
        }
    }

    fn csv_mock() -> MockSmi {
        MockSmi {
            help: Some(HELP_QUERY_GPU),
            csv: Some(QUERY_GPU_CSV),
            ..MockSmi::default()
        }
    }

    fn xml_config() -> Config {
        Config {
            use_csv_format: false,
            ..Config::default()
        }
    }

    fn prepare(config: Config, mock: MockSmi) -> NvidiaSmi {
        let mut nv = NvidiaSmi::with_exec(config, mock);
        nv.init().unwrap();
        nv
    }

    fn snapshot(entries: &[(String, i64)]) -> Snapshot {
        entries.iter().cloned().collect()
    }

    fn gpu(uuid: &str, entries: &[(&str, i64)], pstate: u8) -> Vec<(String, i64)> {
        let mut out: Vec<(String, i64)> = entries
            .iter()
            .map(|(k, v)| (format!("gpu_{}_{}", uuid, k), *v))
            .collect();
        for p in 0..=15u8 {
            out.push((
                format!("gpu_{}_performance_state_P{}", uuid, p),
                i64::from(p == pstate),
            ));
        }
        out
    }

    fn expected_csv() -> Snapshot {
        let mut entries = gpu(
            RTX,
            &[
                ("fan_speed_perc", 30),
                ("gpu_utilization", 2),
                ("mem_utilization", 5),
                ("frame_buffer_memory_usage_used", 1_137_704_960),
                ("frame_buffer_memory_usage_free", 11_452_547_072),
                ("frame_buffer_memory_usage_reserved", 293_601_280),
                ("temperature", 45),
                ("graphics_clock", 210),
                ("video_clock", 555),
                ("sm_clock", 210),
                ("mem_clock", 405),
                ("power_draw", 17_360),
            ],
            8,
        );
        entries.extend(gpu(
            TESLA,
            &[
                ("gpu_utilization", 87),
                ("mem_utilization", 40),
                ("frame_buffer_memory_usage_used", 14_680_064_000),
                ("frame_buffer_memory_usage_free", 844_103_680),
                ("frame_buffer_memory_usage_reserved", 267_386_880),
                ("temperature", 71),
                ("graphics_clock", 1590),
                ("video_clock", 1395),
                ("sm_clock", 1590),
                ("mem_clock", 5000),
            ],
            0,
        ));
        snapshot(&entries)
    }

    fn expected_xml() -> Snapshot {
        snapshot(&gpu(
            GTX,
            &[
                ("fan_speed_perc", 36),
                ("gpu_utilization", 3),
                ("mem_utilization", 7),
                ("frame_buffer_memory_usage_used", 1_170_210_816),
                ("frame_buffer_memory_usage_free", 2_930_769_920),
                ("frame_buffer_memory_usage_reserved", 192_937_984),
                ("temperature", 51),
                ("graphics_clock", 300),
                ("video_clock", 540),
                ("sm_clock", 300),
                ("mem_clock", 405),
                ("power_draw", 11_090),
            ],
            8,
        ))
    }

    fn ensure_charts_backed(nv: &NvidiaSmi, mx: &Snapshot) {
        for chart in nv.charts().iter() {
            for id in chart.referenced_ids() {
                assert!(mx.contains_key(id), "no data for '{}' chart '{}'", id, chart.id);
            }
        }
    }

    #[test]
    fn test_init() {
        let mut nv = NvidiaSmi::new(Config {
            binary_path: "/nonexistent/nvidia-smi".into(),
            ..Config::default()
        });
        assert_matches!(nv.init(), Err(ConfigError::BinaryNotFound(_)));

        let mut nv = NvidiaSmi::new(Config {
            binary_path: "/bin/sh".into(),
            ..Config::default()
        });
        assert!(nv.init().is_ok());

        assert!(NvidiaSmi::with_exec(Config::default(), MockSmi::default()).init().is_ok());
    }

    #[test]
    fn test_collect_csv() {
        let mut nv = prepare(Config::default(), csv_mock());

        let mx = nv.collect().unwrap();

        assert_eq!(mx, expected_csv());
        ensure_charts_backed(&nv, &mx);
        let charts = nv.charts();
        // No fan and no power readings on the second GPU.
        assert_eq!(charts.len(), 9 + 7);
        assert!(!charts.has_chart(&format!("gpu_{TESLA}_fan_speed_perc")));
        assert!(!charts.has_chart(&format!("gpu_{TESLA}_power_draw")));
        let chart = charts.get_chart(&format!("gpu_{TESLA}_temperature")).unwrap();
        assert_eq!(chart.labels["product_name"], "Tesla T4");
    }

    #[test]
    fn test_csv_properties_are_discovered_once() {
        let mock = csv_mock();
        let calls = mock.calls.clone();
        let mut nv = prepare(Config::default(), mock);

        nv.collect().unwrap();
        nv.collect().unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.help, 1);
        assert_eq!(calls.csv.len(), 2);
        assert_eq!(calls.csv[0], QUERY_PROPERTIES);
    }

    #[test]
    fn test_collect_xml() {
        let mock = MockSmi {
            xml: Some(QUERY_GPU_XML),
            ..MockSmi::default()
        };
        let calls = mock.calls.clone();
        let mut nv = prepare(xml_config(), mock);

        let mx = nv.collect().unwrap();

        assert_eq!(mx, expected_xml());
        ensure_charts_backed(&nv, &mx);
        assert_eq!(nv.charts().len(), 9);
        assert_eq!(calls.lock().unwrap().help, 0);
    }

    #[test]
    fn test_collect_twice_creates_nothing_new() {
        let mut nv = prepare(Config::default(), csv_mock());
        nv.collect().unwrap();
        let charts = nv.charts().clone();

        nv.collect().unwrap();

        assert_eq!(nv.charts(), &charts);
        assert!(nv.controller().last_report().unwrap().materialized.is_empty());
    }

    #[test]
    fn test_check_fails() {
        // Binary fails.
        assert!(!prepare(Config::default(), MockSmi::default()).check());
        assert!(!prepare(xml_config(), MockSmi::default()).check());

        // Help works, query fails.
        let mock = MockSmi {
            help: Some(HELP_QUERY_GPU),
            ..MockSmi::default()
        };
        assert!(!prepare(Config::default(), mock).check());

        // Garbage output.
        let mock = MockSmi {
            help: Some(HELP_QUERY_GPU),
            csv: Some("hello and\n goodbye"),
            xml: Some("hello and\n goodbye"),
            ..MockSmi::default()
        };
        let mut nv = prepare(Config::default(), mock.clone());
        assert_matches!(nv.try_collect(), Err(CollectError::BadPayload(_)));
        assert!(nv.charts().is_empty());
        assert!(!prepare(xml_config(), mock).check());
    }

    #[test]
    fn test_help_without_uuid_fails() {
        let mock = MockSmi {
            help: Some("\"name\"\n\"fan.speed\"\n"),
            csv: Some(QUERY_GPU_CSV),
            ..MockSmi::default()
        };
        let calls = mock.calls.clone();
        let mut nv = prepare(Config::default(), mock);

        assert_matches!(nv.try_collect(), Err(CollectError::BadPayload(_)));
        assert_matches!(nv.try_collect(), Err(CollectError::BadPayload(_)));
        assert_eq!(calls.lock().unwrap().help, 2);
        assert!(calls.lock().unwrap().csv.is_empty());
    }

    #[test]
    fn test_collect_without_init_fails() {
        let mut nv = NvidiaSmi::new(Config::default());
        assert_matches!(nv.try_collect(), Err(CollectError::Transport(_)));
    }

    #[test]
    fn test_config_from_yaml() {
        let cfg: Config =
            serde_yaml::from_str("binary_path: /usr/bin/nvidia-smi\nuse_csv_format: false\ntimeout: 500ms\n")
                .unwrap();
        assert_eq!(cfg.binary_path, "/usr/bin/nvidia-smi");
        assert!(!cfg.use_csv_format);
        assert_eq!(cfg.timeout, Duration::from_millis(500));
        assert_eq!(cfg.update_every, Duration::from_secs(10));
    }
}
