//! Error types for sources.

use thiserror::Error;

/// Errors that can occur when fetching a snapshot from a source.
///
/// The engine treats every variant the same way: the source is absent for
/// the current tick, the failure is logged, and the remaining sources still
/// contribute. No variant is fatal and nothing is retried.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response body was not valid JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Reading a local snapshot file failed.
    #[error("failed to read snapshot file: {0}")]
    Io(String),

    /// The source was configured with invalid request options. Unlike
    /// the other variants this is raised synchronously at build time,
    /// never during a tick.
    #[error("invalid source configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connection(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}
