//! A minimal HTTP/1.1 server with hand-written framing and routing.
//!
//! Requests are read straight off a byte stream: the header block is
//! collected until the blank line, split into a request line and headers, and
//! the body is read up to its declared `content-length`. The request is then
//! routed by method and path template (`/items/:id`) to an async handler.
//!
//! # Features
//!
//! - Incremental reading that does not care how the bytes are fragmented
//! - Path templates with named parameters, first registered match wins
//! - One task per connection, with a registry that can close them all at once
//! - JSON helpers on requests and responses
//!
//! One request is served per connection. Keep-alive, chunked encoding, TLS
//! and HTTP/2 are not supported, and query strings are not percent-decoded.
//!
//! # Examples
//!
//! ## Parsing
//!
//! ```
//! use microroute::parse_request;
//!
//! let raw = b"POST /items?tag=new HTTP/1.1\r\nContent-Type: Application/JSON\r\nContent-Length: 2\r\n\r\n{}";
//! let request = parse_request(raw).unwrap();
//!
//! assert_eq!(request.method().as_str(), "POST");
//! assert_eq!(request.path(), "/items");
//! assert_eq!(request.query_param("tag"), Some("new"));
//! assert_eq!(request.header("content-type"), Some("application/json"));
//! assert_eq!(request.body, b"{}");
//! ```
//!
//! ## Routing
//!
//! ```
//! use microroute::{path_match, Router, HttpResponse, StatusCode};
//!
//! let params = path_match("/items/42", "/items/:id").unwrap();
//! assert_eq!(params["id"], "42");
//!
//! let mut router = Router::new();
//! router.get("/items/:id", |req| async move {
//!     let id = req.path_param("id").unwrap_or_default().to_string();
//!     Ok(HttpResponse::new(StatusCode::Ok).with_body_string(id))
//! });
//! assert_eq!(router.len(), 1);
//! ```
//!
//! See `demos/items_server.rs` for a runnable server.

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{
    parse_head, parse_request, Error as ParserError, Headers, HttpRequest, HttpVersion, Method,
    RequestLine,
};
pub use server::{
    path_match, ConnectionId, ConnectionRegistry, Error as ServerError, HttpResponse, HttpServer,
    PathTemplate, Router, ServerConfig, StatusCode,
};
