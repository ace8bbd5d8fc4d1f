//! Error types shared by the engine, the sample sources and the modules.
//!
//! The split follows the failure scope:
//! - [`ConfigError`] is fatal to a module at startup.
//! - [`CollectError`] (wrapping [`TransportError`] or a bad payload) aborts a
//!   single collection cycle.
//! - [`TemplateError`] and [`MaterializeError`] are local to one entity and
//!   never abort a cycle.

use thiserror::Error;

use crate::collector::EntityClass;

/// Invalid or missing module configuration, detected once in `init`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{0}' can not be empty")]
    Empty(&'static str),
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("can not find '{0}' binary in PATH")]
    BinaryNotFound(String),
    #[error("init HTTP client: {0}")]
    HttpClient(String),
}

/// Failure to obtain raw data from the target.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("returned HTTP status code {0}")]
    Status(u16),
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("'{command}' failed: {reason}")]
    Exec { command: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A whole-cycle failure: no snapshot is produced and nothing is materialized.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bad payload: {0}")]
    BadPayload(String),
}

impl CollectError {
    pub fn bad_payload(msg: impl Into<String>) -> Self {
        CollectError::BadPayload(msg.into())
    }
}

/// Decoder failure: exposition text, CSV, XML or an NTP control reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl From<ParseError> for CollectError {
    fn from(e: ParseError) -> Self {
        CollectError::BadPayload(e.message)
    }
}

/// Identifier template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{pattern}' declares {declared} placeholder(s) but got {got} part(s)")]
    Arity {
        pattern: &'static str,
        declared: usize,
        got: usize,
    },
    #[error("template '{pattern}' does not match its declared arity {declared}")]
    Malformed {
        pattern: &'static str,
        declared: usize,
    },
    #[error("identifier '{part}' contains reserved character {ch:?} (template '{pattern}')")]
    ReservedChar {
        pattern: &'static str,
        part: String,
        ch: char,
    },
}

/// Charts of one entity could not be created. The entity stays unknown and is
/// retried on the next cycle it is seen in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("chart '{0}' already exists")]
    DuplicateChart(String),
    #[error("chart '{chart}' already has dimension '{dim}'")]
    DuplicateDim { chart: String, dim: String },
    #[error("chart '{0}' does not exist")]
    MissingChart(String),
    #[error("chart '{chart}' references '{id}' which has no value in this cycle")]
    Unbacked { chart: String, id: String },
    #[error("entity class '{0}' is not handled by this module")]
    UnsupportedClass(EntityClass),
}
