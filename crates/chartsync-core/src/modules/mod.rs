//! Collector modules.
//!
//! - `cassandra` - Cassandra nodes through the JMX exporter (HTTP)
//! - `wmi` - Windows hosts through a windows_exporter endpoint (HTTP)
//! - `ntpd` - ntpd through its control port (NTP mode 6 over UDP)
//! - `nvidia_smi` - NVIDIA GPUs through the `nvidia-smi` binary

pub mod cassandra;
pub mod ntpd;
pub mod nvidia_smi;
pub mod wmi;
