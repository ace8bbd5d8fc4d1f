//! Utility modules for chartsync.

mod duration;

pub use duration::deserialize_duration;
