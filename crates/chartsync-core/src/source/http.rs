//! HTTP sample source backed by a blocking `reqwest` client.

use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;

use crate::error::{ConfigError, TransportError};

use super::SampleSource;

/// Scrapes one URL with a bounded timeout.
#[derive(Debug)]
pub struct HttpSource {
    client: Option<Client>,
    url: Url,
    timeout: Duration,
}

impl HttpSource {
    /// Validates the URL and builds the client.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let url = parse_url(url)?;
        let client = build_client(timeout)?;
        Ok(Self {
            client: Some(client),
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Checks that `raw` is a non-empty absolute http(s) URL.
pub fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Empty("url"));
    }
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

impl SampleSource for HttpSource {
    fn fetch(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.client.is_none() {
            self.client = Some(
                build_client(self.timeout).map_err(|e| TransportError::Request(e.to_string()))?,
            );
        }
        let Some(client) = self.client.as_ref() else {
            return Err(TransportError::Request("HTTP client is not initialized".into()));
        };

        let timeout = self.timeout;
        let to_transport = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Request(e.to_string())
            }
        };

        let response = client
            .get(self.url.clone())
            .send()
            .map_err(to_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.bytes().map_err(to_transport)?;
        Ok(body.to_vec())
    }

    fn close(&mut self) {
        // Dropping the client closes its idle pool; a new one is built lazily.
        self.client = None;
    }
}
