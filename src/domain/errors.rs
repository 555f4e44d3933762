use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::domain::timeline::Granularity;

/// Coarse failure category surfaced to the host next to a retry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(tag = "type", content = "status", rename_all = "camelCase")]
pub enum ErrorKind {
    #[display(fmt = "network")]
    Network,
    #[display(fmt = "http {}", _0)]
    Http(u16),
    #[display(fmt = "parse")]
    Parse,
}

/// Failure reported by a data collaborator.
#[derive(Debug, Clone, PartialEq, Display)]
#[display(fmt = "{} error: {}", kind, message)]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Http(status), message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }
}

impl std::error::Error for FetchError {}

/// Root error type of the engine.
///
/// Boundary moves, stale responses and malformed buckets are deliberately
/// absent: they are handled as no-ops or fail-soft values, never as errors.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum TimelineError {
    #[display(fmt = "Unknown granularity: {}", _0)]
    UnknownGranularity(String),
    #[display(fmt = "No dataset bounds loaded for {}", _0)]
    MissingBounds(Granularity),
    #[display(fmt = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[display(fmt = "Fetch failed: {}", _0)]
    Fetch(FetchError),
}

impl std::error::Error for TimelineError {}

impl From<FetchError> for TimelineError {
    fn from(error: FetchError) -> Self {
        TimelineError::Fetch(error)
    }
}

pub type TimelineResult<T> = Result<T, TimelineError>;
pub type FetchResult<T> = Result<T, FetchError>;
