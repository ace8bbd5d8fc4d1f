//! Running the `nvidia-smi` binary.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{ConfigError, TransportError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The queries the module issues.
pub trait SmiExec: Send {
    /// `nvidia-smi -q -x`
    fn query_gpu_info_xml(&mut self) -> Result<Vec<u8>, TransportError>;

    /// `nvidia-smi --query-gpu=<properties> --format=csv,nounits`
    fn query_gpu_info_csv(&mut self, properties: &[String]) -> Result<Vec<u8>, TransportError>;

    /// `nvidia-smi --help-query-gpu`
    fn query_help_query_gpu(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// Runs the binary as a child process, killed if it outlives `timeout`.
#[derive(Debug, Clone)]
pub struct ExecSmi {
    bin_path: PathBuf,
    timeout: Duration,
}

impl ExecSmi {
    pub fn new(bin_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin_path: bin_path.into(),
            timeout,
        }
    }

    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, TransportError> {
        let command = format!("{} {}", self.bin_path.display(), args.join(" "));
        let exec_err = |reason: String| TransportError::Exec {
            command: command.clone(),
            reason,
        };

        let mut child = Command::new(&self.bin_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| exec_err(e.to_string()))?;

        // Drain stdout concurrently so a large report can not fill the pipe
        // and stall the child.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| exec_err("stdout is not captured".into()))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                debug!(%command, "killed after {:?}", self.timeout);
                return Err(TransportError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = reader
            .join()
            .map_err(|_| exec_err("stdout reader panicked".into()))??;
        if !status.success() {
            return Err(exec_err(format!("exited with {}", status)));
        }
        Ok(output)
    }
}

impl SmiExec for ExecSmi {
    fn query_gpu_info_xml(&mut self) -> Result<Vec<u8>, TransportError> {
        self.run(&["-q", "-x"])
    }

    fn query_gpu_info_csv(&mut self, properties: &[String]) -> Result<Vec<u8>, TransportError> {
        let query = format!("--query-gpu={}", properties.join(","));
        self.run(&[&query, "--format=csv,nounits"])
    }

    fn query_help_query_gpu(&mut self) -> Result<Vec<u8>, TransportError> {
        self.run(&["--help-query-gpu"])
    }
}

/// Finds an executable named `name` in the directories of `PATH`.
pub fn look_path(name: &str) -> Result<PathBuf, ConfigError> {
    let paths = env::var_os("PATH").ok_or_else(|| ConfigError::BinaryNotFound(name.to_string()))?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| ConfigError::BinaryNotFound(name.to_string()))
}
