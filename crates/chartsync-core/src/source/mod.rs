//! Abstractions over where raw samples come from.
//!
//! The `SampleSource` trait allows HTTP-scraping modules to work with both a
//! real endpoint and canned responses in tests, the same way the exec and
//! NTP modules take their transport through a trait.

pub mod http;
pub mod mock;

use crate::error::TransportError;

pub use http::HttpSource;
pub use mock::{MockResponse, MockSource};

/// A target that returns a raw payload per request.
pub trait SampleSource: Send {
    /// Performs one bounded round-trip and returns the response body.
    ///
    /// Connection failures, timeouts and non-success statuses are all
    /// [`TransportError`]s; the payload itself is not inspected.
    fn fetch(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Drops idle connections. Called from module cleanup.
    fn close(&mut self) {}
}
