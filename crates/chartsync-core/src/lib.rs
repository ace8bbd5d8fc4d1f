//! chartsync-core - entity discovery and chart synchronization for collector
//! modules.
//!
//! Provides:
//! - `charts` - charts, dimensions, the chart set and chart templates
//! - `collector` - entity registry, chart synchronizer, cycle controller and
//!   the `Module` trait
//! - `source` - sample sources (HTTP endpoint, canned responses)
//! - `prometheus` - text exposition parser used by the scrapers
//! - `modules` - the `wmi`, `ntpd`, `nvidia_smi` and `cassandra` collector modules
//! - `error` - error types
//! - `util` - helper utilities

pub mod charts;
pub mod collector;
pub mod error;
pub mod modules;
pub mod prometheus;
pub mod source;
pub mod util;
