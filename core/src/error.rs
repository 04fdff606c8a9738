//! Error types for the tabledb client.
//!
//! # Design
//! Non-2xx responses are not errors here: they come back as ordinary
//! `HttpResponse` values and callers inspect `is_success()`. The variants
//! below cover transport failures, local I/O, and inputs rejected before any
//! request is built.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `TableDbClient` and its helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The request could not be assembled (bad URL or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reading or writing a local stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query parameters could not be form-encoded.
    #[error("query string encoding failed: {0}")]
    QueryEncoding(#[from] serde_qs::Error),

    /// The download destination could not be opened for writing.
    #[error("cannot open {} for writing: {source}", path.display())]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upsert input was neither a record object nor a list of records.
    #[error("invalid records: {0}")]
    InvalidRecords(String),

    /// No API key was found in the environment.
    #[error("no API key found; set TABLEDB_API_KEY")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_error_names_the_path() {
        let err = Error::DestinationNotWritable {
            path: PathBuf::from("/nope/out.bin"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("cannot open /nope/out.bin for writing"));
    }

    #[test]
    fn invalid_records_display() {
        let err = Error::InvalidRecords("expected object or array, got number".into());
        assert_eq!(
            err.to_string(),
            "invalid records: expected object or array, got number"
        );
    }
}
