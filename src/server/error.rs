//! Error types for the HTTP server.

use std::fmt;

use thiserror::Error;

use crate::parser::{Error as ParserError, Method};

/// Which framing unit was being read when the peer went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    Headers,
    Body,
}

impl fmt::Display for ReadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadPhase::Headers => f.write_str("headers"),
            ReadPhase::Body => f.write_str("body"),
        }
    }
}

/// Errors that can occur while serving a connection.
///
/// Every variant is scoped to the connection it arose on.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The peer closed the stream before a framing unit was complete.
    #[error("Connection closed while reading {phase} after {received} bytes")]
    ConnectionClosed { phase: ReadPhase, received: usize },

    /// The header block grew past the configured limit without a terminator.
    #[error("Header block exceeds {0} bytes")]
    HeadersTooLarge(usize),

    /// The declared content-length is above the configured limit.
    #[error("Declared body of {declared} bytes exceeds limit of {limit}")]
    BodyTooLarge { declared: usize, limit: usize },

    /// No route is registered for the request method at all.
    #[error("No route for method {0}")]
    NoRouteForMethod(Method),

    /// Routes exist for the method but none matches the path.
    #[error("No route matches {0} {1}")]
    NoMatchingRoute(Method, String),

    /// A handler failed.
    #[error("Handler error: {0}")]
    HandlerError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// True for routing misses, which are answered with `400 Bad Request`.
    pub fn is_routing_miss(&self) -> bool {
        matches!(self, Error::NoRouteForMethod(_) | Error::NoMatchingRoute(..))
    }
}
