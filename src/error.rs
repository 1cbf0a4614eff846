//! Error types shared by the catalog walk and its collaborators.
//!
//! Remote failures are split into [`Error::Transient`] (worth retrying) and
//! [`Error::Permanent`] (never retried). Everything else aborts the run.

use std::{fmt, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Timeout, rate limit or 5xx. Retried by [`crate::catalog::ResilientFetch`].
    #[error("transient remote failure: {message}")]
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Auth rejected, resource not found, malformed request or response.
    #[error("remote request failed{}: {message}", status_suffix(.status))]
    Permanent { status: Option<u16>, message: String },

    /// The retry cap was hit while the remote kept failing transiently.
    #[error("{operation}: giving up after {attempts} attempts, last error: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<Error>,
    },

    /// The OAuth `state` returned to the callback differs from the issued one.
    #[error("OAuth state mismatch: expected {expected}, received {received:?}")]
    StateMismatch {
        expected: String,
        received: Option<String>,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    /// A playlist write stopped, by failure or cancellation, after earlier
    /// chunks had been written.
    #[error("{0}")]
    PartialWrite(Box<PartialWrite>),

    #[error("cancelled during {0}")]
    Cancelled(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Error::Transient {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn permanent(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Permanent {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return Error::transient(err.to_string());
        }
        if let Some(status) = err.status() {
            if status.is_server_error() || status.as_u16() == 429 {
                return Error::transient(err.to_string());
            }
            return Error::permanent(Some(status.as_u16()), err.to_string());
        }
        Error::permanent(None, err.to_string())
    }
}

/// What was and was not appended when a chunk write failed or was cancelled.
///
/// Chunks are written strictly in order, so every chunk with an index below
/// `failed_chunk` is in the playlist and nothing after it is.
#[derive(Debug)]
pub struct PartialWrite {
    pub playlist_id: String,
    pub succeeded_chunks: usize,
    pub tracks_written: usize,
    pub failed_chunk: usize,
    pub failed_track_ids: Vec<String>,
    pub source: Error,
}

impl fmt::Display for PartialWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "playlist {} partially written: chunks 0..{} ({} tracks) were appended, chunk {} ({} tracks) failed: {}",
            self.playlist_id,
            self.succeeded_chunks,
            self.tracks_written,
            self.failed_chunk,
            self.failed_track_ids.len(),
            self.source
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
