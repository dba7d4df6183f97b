//! Error types for the favorites pipeline.
//!
//! Each pipeline stage has its own error type. [`InvalidInputError`],
//! [`FetchError`] and [`WriteError`] are fatal and end the run; they are
//! wrapped by [`WcfavError`], whose message names the failing stage.
//! [`MappingError`] is per-record and never aborts a run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The favorites URL (or a setting derived from the command line) is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidInputError(pub String);

impl InvalidInputError {
    pub fn new(msg: impl Into<String>) -> Self {
        InvalidInputError(msg.into())
    }
}

/// Why a single API request failed.
#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("request timed out after {}", human(.0))]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Payload(String),
}

fn human(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

/// A request for a batch of sessions failed.
#[derive(Error, Debug)]
#[error("sessions [{}]: {failure}", ids.join(", "))]
pub struct FetchError {
    /// Identifiers of the chunk whose request failed
    pub ids: Vec<String>,
    pub failure: FetchFailure,
}

/// A session record could not be turned into a calendar event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("session {}: {reason}", session_id.as_deref().unwrap_or("<unknown>"))]
pub struct MappingError {
    pub session_id: Option<String>,
    pub reason: String,
}

impl MappingError {
    pub fn new(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        MappingError {
            session_id: Some(session_id.into()),
            reason: reason.into(),
        }
    }
}

/// The calendar file could not be written.
#[derive(Error, Debug)]
#[error("could not write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Fatal errors that abort a run.
#[derive(Error, Debug)]
pub enum WcfavError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("write failed: {0}")]
    Write(#[from] WriteError),
}

/// Result type alias for pipeline operations.
pub type WcfavResult<T> = Result<T, WcfavError>;
