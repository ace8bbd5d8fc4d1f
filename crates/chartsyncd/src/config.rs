//! Job file.
//!
//! ```yaml
//! jobs:
//!   - name: win_server
//!     module: wmi
//!     url: http://10.0.0.5:9182/metrics
//!   - name: local
//!     module: ntpd
//!     collect_peers: false
//!   - name: gpus
//!     module: nvidia_smi
//!     update_every: 30s
//!   - name: cassandra
//!     module: cassandra
//!     url: http://127.0.0.1:7072/metrics
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chartsync_core::collector::Module;
use chartsync_core::modules::{cassandra, ntpd, nvidia_smi, wmi};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobFileError {
    #[error("can not read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("can not parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("'{0}': no jobs defined")]
    NoJobs(PathBuf),
    #[error("job name can not be empty")]
    EmptyName,
    #[error("duplicate job name '{0}'")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobFile {
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(flatten)]
    pub module: ModuleConfig,
}

/// Module selected by the `module` key, with that module's own settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum ModuleConfig {
    Wmi(wmi::Config),
    Ntpd(ntpd::Config),
    NvidiaSmi(nvidia_smi::Config),
    Cassandra(cassandra::Config),
}

impl ModuleConfig {
    pub fn update_every(&self) -> Duration {
        match self {
            ModuleConfig::Wmi(c) => c.update_every,
            ModuleConfig::Ntpd(c) => c.update_every,
            ModuleConfig::NvidiaSmi(c) => c.update_every,
            ModuleConfig::Cassandra(c) => c.update_every,
        }
    }

    /// Creates the module. It still has to be initialized.
    pub fn build(&self) -> Box<dyn Module> {
        match self {
            ModuleConfig::Wmi(c) => Box::new(wmi::Wmi::new(c.clone())),
            ModuleConfig::Ntpd(c) => Box::new(ntpd::Ntpd::new(c.clone())),
            ModuleConfig::NvidiaSmi(c) => Box::new(nvidia_smi::NvidiaSmi::new(c.clone())),
            ModuleConfig::Cassandra(c) => Box::new(cassandra::Cassandra::new(c.clone())),
        }
    }
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self, JobFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| JobFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: JobFile = serde_yaml::from_str(&text).map_err(|source| JobFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if file.jobs.is_empty() {
            return Err(JobFileError::NoJobs(path.to_path_buf()));
        }
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), JobFileError> {
        let mut names = HashSet::new();
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                return Err(JobFileError::EmptyName);
            }
            if !names.insert(job.name.as_str()) {
                return Err(JobFileError::DuplicateName(job.name.clone()));
            }
        }
        Ok(())
    }
}
