//! In-memory sample source for testing modules without a live target.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::error::TransportError;

use super::SampleSource;

/// One canned outcome of [`MockSource::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Body(Vec<u8>),
    Status(u16),
    Refused,
    Timeout,
}

/// Returns queued responses in order. The last response repeats forever, so a
/// module can be checked and collected with the same source.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    responses: VecDeque<MockResponse>,
    calls: usize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        Self::new().then(MockResponse::Body(body.into()))
    }

    pub fn status(code: u16) -> Self {
        Self::new().then(MockResponse::Status(code))
    }

    pub fn refused() -> Self {
        Self::new().then(MockResponse::Refused)
    }

    /// Queues another response after the current ones.
    pub fn then(mut self, response: MockResponse) -> Self {
        self.responses.push_back(response);
        self
    }

    pub fn then_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.then(MockResponse::Body(body.into()))
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl SampleSource for MockSource {
    fn fetch(&mut self) -> Result<Vec<u8>, TransportError> {
        self.calls += 1;

        let response = if self.responses.len() > 1 {
            self.responses.pop_front()
        } else {
            self.responses.front().cloned()
        };

        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(code)) => Err(TransportError::Status(code)),
            Some(MockResponse::Refused) => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Some(MockResponse::Timeout) => Err(TransportError::Timeout(Duration::from_secs(5))),
            None => Err(TransportError::Request("no response configured".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_response_repeats() {
        let mut source = MockSource::body("a").then_body("b");

        assert_eq!(source.fetch().unwrap(), b"a");
        assert_eq!(source.fetch().unwrap(), b"b");
        assert_eq!(source.fetch().unwrap(), b"b");
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_error_responses() {
        assert!(matches!(
            MockSource::status(404).fetch(),
            Err(TransportError::Status(404))
        ));
        assert!(matches!(
            MockSource::refused().fetch(),
            Err(TransportError::Io(e)) if e.kind() == io::ErrorKind::ConnectionRefused
        ));
        assert!(matches!(
            MockSource::new().then(MockResponse::Timeout).fetch(),
            Err(TransportError::Timeout(_))
        ));
        assert!(MockSource::new().fetch().is_err());
    }
}
