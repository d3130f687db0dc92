//! HTTP server implementation for microroute-rs.
//!
//! Connection framing, routing, connection tracking and the accept loop
//! that ties them together.

mod response;
mod config;
mod connection;
mod error;
mod handler;
mod http_server;
mod path;
mod registry;
mod router;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use connection::{read_request, ConnectionReader};
pub use error::{Error, ReadPhase};
pub use handler::{HandlerFn, HandlerFuture, Route};
pub use http_server::HttpServer;
pub use path::{path_match, PathParams, PathTemplate, Segment};
pub use registry::{ConnectionGuard, ConnectionId, ConnectionRegistry};
pub use router::Router;
