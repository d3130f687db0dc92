//! HTTP parser module.
//!
//! Turns a raw header block into a request line and a header map, and
//! assembles those with a body into an [`HttpRequest`]. No parsing library is
//! involved; everything here works on plain string splitting.

mod request;
mod headers;
mod method;
mod version;
mod error;
mod tests;

// Re-export public items
pub use request::{HttpRequest, RequestLine};
pub use headers::Headers;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{parse_head, parse_request};
pub(crate) use request::{find_header_end, HEADER_TERMINATOR};
