//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while parsing a request head or body.
#[derive(Debug, Error)]
pub enum Error {
    /// The header block was empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The request line is malformed (wrong token count, bad version, not UTF-8).
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A header line has no `:` separator.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The `content-length` header is not a non-negative integer.
    #[error("Invalid content-length: {0}")]
    InvalidContentLength(String),

    /// An in-memory request carried fewer body bytes than it declared.
    #[error("Incomplete body: expected {expected} bytes, got {received}")]
    IncompleteBody { expected: usize, received: usize },

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
