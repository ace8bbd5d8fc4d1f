//! ntpd monitored over its control port (NTP mode 6).
//!
//! Each cycle reads the system variables and, when `collect_peers` is set,
//! the variables of every peer association. Association ids are looked up
//! again only every few minutes. A failed cycle drops the connection; the
//! next one reconnects.

mod charts;
mod client;
mod collect;

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::charts::ChartSet;
use crate::collector::{CycleController, Module, Snapshot};
use crate::error::{CollectError, ConfigError, TransportError};
use crate::util::deserialize_duration;

pub use charts::{NtpdCharts, PRECISION};
pub use client::{NtpConn, UdpNtpConn, Vars};
pub use collect::{NtpSample, SYSTEM_FAMILY, normalize};

const FIND_PEERS_EVERY: Duration = Duration::from_secs(3 * 60);

fn default_address() -> String {
    "127.0.0.1:123".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_collect_peers() -> bool {
    true
}

fn default_update_every() -> Duration {
    Duration::from_secs(1)
}

/// Job configuration of the ntpd module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(default = "default_collect_peers")]
    pub collect_peers: bool,
    #[serde(default = "default_update_every", deserialize_with = "deserialize_duration")]
    pub update_every: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            timeout: default_timeout(),
            collect_peers: default_collect_peers(),
            update_every: default_update_every(),
        }
    }
}

/// Opens a connection for a job.
pub type Connect = Box<dyn Fn(&Config) -> Result<Box<dyn NtpConn>, TransportError> + Send>;

fn connect_udp(config: &Config) -> Result<Box<dyn NtpConn>, TransportError> {
    Ok(Box::new(UdpNtpConn::connect(&config.address, config.timeout)?))
}

/// Cached peer association ids.
struct PeerIds {
    ids: Vec<u16>,
    found_at: Option<Instant>,
    every: Duration,
}

impl PeerIds {
    fn is_stale(&self) -> bool {
        self.found_at.is_none_or(|t| t.elapsed() >= self.every)
    }
}

pub struct Ntpd {
    config: Config,
    connect: Connect,
    conn: Option<Box<dyn NtpConn>>,
    controller: CycleController,
    peers: PeerIds,
}

impl Ntpd {
    pub fn new(config: Config) -> Self {
        Self::with_connect(config, connect_udp)
    }

    /// Uses `connect` to open connections instead of a UDP socket.
    pub fn with_connect(
        config: Config,
        connect: impl Fn(&Config) -> Result<Box<dyn NtpConn>, TransportError> + Send + 'static,
    ) -> Self {
        Self {
            config,
            connect: Box::new(connect),
            conn: None,
            controller: CycleController::new(),
            peers: PeerIds {
                ids: Vec::new(),
                found_at: None,
                every: FIND_PEERS_EVERY,
            },
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &CycleController {
        &self.controller
    }
}

/// Reads the system variables and, if `peers` is given, the variables of each
/// peer. A failing peer is skipped.
fn fetch(conn: &mut dyn NtpConn, peers: Option<&mut PeerIds>) -> Result<NtpSample, CollectError> {
    let mut sample = NtpSample {
        system: conn.system_info()?,
        peers: Vec::new(),
    };

    let Some(peers) = peers else {
        return Ok(sample);
    };
    if peers.is_stale() {
        peers.ids = conn.peer_ids()?;
        peers.found_at = Some(Instant::now());
        debug!(peers = peers.ids.len(), "peer associations refreshed");
    }
    for &id in &peers.ids {
        match conn.peer_info(id) {
            Ok(vars) => sample.peers.push(vars),
            Err(e) => warn!(assoc_id = id, "can not query peer: {}", e),
        }
    }
    Ok(sample)
}

fn validate_address(address: &str) -> Result<(), ConfigError> {
    if address.is_empty() {
        return Err(ConfigError::Empty("address"));
    }
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ConfigError::InvalidAddress(address.to_string()))?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(ConfigError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

impl Module for Ntpd {
    fn name(&self) -> &'static str {
        "ntpd"
    }

    fn init(&mut self) -> Result<(), ConfigError> {
        validate_address(&self.config.address)
    }

    fn try_collect(&mut self) -> Result<Snapshot, CollectError> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => (self.connect)(&self.config)?,
        };
        let peers = self.config.collect_peers.then_some(&mut self.peers);

        let result = self.controller.run_cycle(
            &NtpdCharts,
            || fetch(conn.as_mut(), peers),
            |sample| Ok(normalize(&sample)),
        );

        match result {
            Ok(mx) => {
                self.conn = Some(conn);
                Ok(mx)
            }
            Err(e) => {
                conn.close();
                Err(e)
            }
        }
    }

    fn charts(&self) -> &ChartSet {
        self.controller.charts()
    }

    fn cleanup(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }
}
