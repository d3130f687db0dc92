//! HTTP request parsing and representation.

use std::collections::HashMap;
use serde::de::DeserializeOwned;

use crate::parser::error::Error;
use crate::parser::headers::Headers;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;
use crate::server::ConnectionId;

/// The byte sequence that ends the header block.
pub(crate) const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Position of the first header terminator in `buf`, if any.
pub(crate) fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// The first line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The method token, case preserved.
    pub method: Method,
    /// The request path without its query component.
    pub path: String,
    /// Query parameters, taken verbatim (no percent-decoding).
    pub query_params: HashMap<String, String>,
    /// The protocol version, when the client sent one.
    pub version: Option<HttpVersion>,
}

impl RequestLine {
    /// Parse a request line of the form `METHOD target [HTTP/1.x]`.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (method, target, version) = match tokens.as_slice() {
            [method, target] => (*method, *target, None),
            [method, target, version] => (*method, *target, Some(version.parse::<HttpVersion>()?)),
            _ => return Err(Error::MalformedRequestLine(line.to_string())),
        };

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        Ok(Self {
            method: Method::from(method),
            path: path.to_string(),
            query_params: query.map(parse_query).unwrap_or_default(),
            version,
        })
    }
}

// Empty pairs are skipped; a pair without `=` maps its key to "".
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Represents an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method, path, query and version.
    pub line: RequestLine,
    /// The HTTP headers
    pub headers: Headers,
    /// The request body
    pub body: Vec<u8>,
    /// Parameters captured by the matched route template. Empty until routed.
    pub path_params: HashMap<String, String>,
    /// The connection this request arrived on.
    pub connection: ConnectionId,
}

impl HttpRequest {
    /// Create a request from its parsed parts.
    pub fn new(line: RequestLine, headers: Headers, body: Vec<u8>, connection: ConnectionId) -> Self {
        Self {
            line,
            headers,
            body,
            path_params: HashMap::new(),
            connection,
        }
    }

    pub fn method(&self) -> &Method {
        &self.line.method
    }

    pub fn path(&self) -> &str {
        &self.line.path
    }

    /// Get a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.line.query_params.get(name).map(String::as_str)
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.line.query_params.contains_key(name)
    }

    /// Get a value captured from the route template, e.g. `id` for `/items/:id`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// The body as UTF-8 text.
    pub fn body_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Check if the request has a JSON body.
    ///
    /// Header values are stored lower-cased, so this matches any spelling of
    /// `application/json`.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("content-type: application/json".to_string()));
        }

        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Parse a header block (everything before the blank line) into a request
/// line and headers.
///
/// Lines are separated by `\n` and trimmed, which also strips the `\r` of a
/// CRLF. Blank lines after the request line are ignored.
pub fn parse_head(block: &[u8]) -> Result<(RequestLine, Headers), Error> {
    let text = std::str::from_utf8(block)
        .map_err(|_| Error::MalformedRequestLine("invalid UTF-8".to_string()))?;

    let mut lines = text.split('\n').map(str::trim);

    let first = match lines.next() {
        Some(line) if !line.is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };
    let line = RequestLine::parse(first)?;

    let mut headers = Headers::new();
    for header_line in lines.filter(|l| !l.is_empty()) {
        headers.insert_line(header_line)?;
    }

    Ok((line, headers))
}

/// Parse a complete HTTP request held in memory.
///
/// Input without a blank line is treated as a bare header block with no body.
/// Bytes past the declared `content-length` are ignored.
///
/// # Arguments
///
/// * `input` - A byte slice containing the HTTP request to parse
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request is invalid
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let (block, rest) = match find_header_end(input) {
        Some(end) => (&input[..end], &input[end + HEADER_TERMINATOR.len()..]),
        None => (input, &input[input.len()..]),
    };

    let (line, headers) = parse_head(block)?;
    let expected = headers.content_length()?.unwrap_or(0);
    if rest.len() < expected {
        return Err(Error::IncompleteBody { expected, received: rest.len() });
    }

    Ok(HttpRequest::new(line, headers, rest[..expected].to_vec(), ConnectionId::default()))
}
