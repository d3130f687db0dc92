//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::parser::{parse_head, parse_request, Error, Headers, HttpVersion, Method, RequestLine};

    #[test]
    fn test_parse_two_token_request_line() {
        let line = RequestLine::parse("GET /items").unwrap();
        assert_eq!(line.method, Method::GET);
        assert_eq!(line.path, "/items");
        assert!(line.query_params.is_empty());
        assert_eq!(line.version, None);
    }

    #[test]
    fn test_parse_request_line_with_version() {
        let line = RequestLine::parse("POST /items HTTP/1.1").unwrap();
        assert_eq!(line.method, Method::POST);
        assert_eq!(line.path, "/items");
        assert_eq!(line.version, Some(HttpVersion::Http11));

        let line = RequestLine::parse("GET / HTTP/1.0").unwrap();
        assert_eq!(line.version, Some(HttpVersion::Http10));
    }

    #[test]
    fn test_request_line_token_count() {
        assert!(matches!(RequestLine::parse("GET"), Err(Error::MalformedRequestLine(_))));
        assert!(matches!(
            RequestLine::parse("GET /a HTTP/1.1 extra"),
            Err(Error::MalformedRequestLine(_))
        ));
        assert!(matches!(
            RequestLine::parse("GET /a HTTP/9.9"),
            Err(Error::MalformedRequestLine(_))
        ));
    }

    #[test]
    fn test_method_case_is_preserved() {
        let line = RequestLine::parse("get /items").unwrap();
        assert_eq!(line.method, Method::Other("get".to_string()));
        assert_eq!(line.method.to_string(), "get");
        assert_ne!(line.method, Method::GET);

        let line = RequestLine::parse("PURGE /cache").unwrap();
        assert_eq!(line.method.as_str(), "PURGE");
    }

    #[test]
    fn test_query_parameters() {
        let line = RequestLine::parse("GET /search?q=rust&page=2").unwrap();
        assert_eq!(line.path, "/search");
        assert_eq!(line.query_params.len(), 2);
        assert_eq!(line.query_params.get("q").unwrap(), "rust");
        assert_eq!(line.query_params.get("page").unwrap(), "2");
    }

    #[test]
    fn test_query_edge_cases() {
        // Split on the first `=` only, no `=` means empty value, empty pairs skipped.
        let line = RequestLine::parse("GET /x?expr=a=b&flag&&").unwrap();
        assert_eq!(line.query_params.get("expr").unwrap(), "a=b");
        assert_eq!(line.query_params.get("flag").unwrap(), "");
        assert_eq!(line.query_params.len(), 2);

        let line = RequestLine::parse("GET /x?").unwrap();
        assert_eq!(line.path, "/x");
        assert!(line.query_params.is_empty());
    }

    #[test]
    fn test_query_values_are_not_decoded() {
        let line = RequestLine::parse("GET /x?name=a%20b&plus=a+b").unwrap();
        assert_eq!(line.query_params.get("name").unwrap(), "a%20b");
        assert_eq!(line.query_params.get("plus").unwrap(), "a+b");
    }

    #[test]
    fn test_headers_are_case_folded_and_trimmed() {
        let (_, headers) = parse_head(b"GET /\r\nContent-Type:   Application/JSON  \r\n").unwrap();
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        let keys: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["content-type"]);
    }

    #[test]
    fn test_non_ascii_header_name_is_found() {
        let mut headers = Headers::new();
        headers.insert("X-Café", "Latte");
        assert_eq!(headers.get("X-Café"), Some("latte"));
        assert_eq!(headers.get("x-café"), Some("latte"));
        assert!(headers.contains("X-CAFé"));
    }

    #[test]
    fn test_header_value_split_on_first_colon() {
        let (_, headers) = parse_head(b"GET /\r\nHost: localhost:8080\r\n").unwrap();
        assert_eq!(headers.get("host"), Some("localhost:8080"));
    }

    #[test]
    fn test_repeated_header_last_wins() {
        let (_, headers) = parse_head(b"GET /\r\nX-Tag: one\r\nx-tag: Two\r\n").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-tag"), Some("two"));
    }

    #[test]
    fn test_blank_header_lines_skipped() {
        let (_, headers) = parse_head(b"GET /\r\n\r\nA: 1\r\n  \r\nB: 2").unwrap();
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_bare_lf_line_endings() {
        let (line, headers) = parse_head(b"GET /items\nHost: example.com").unwrap();
        assert_eq!(line.path, "/items");
        assert_eq!(headers.get("host"), Some("example.com"));
    }

    #[test]
    fn test_malformed_header() {
        let result = parse_head(b"GET /\r\nInvalidHeader\r\n");
        assert!(matches!(result, Err(Error::MalformedHeader(ref line)) if line == "InvalidHeader"));
    }

    #[test]
    fn test_empty_head() {
        assert!(matches!(parse_head(b""), Err(Error::EmptyRequest)));
        assert!(matches!(parse_head(b"\r\n"), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_invalid_utf8_head() {
        let result = parse_head(b"GET /\xff\xfe\r\n");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_content_length() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length().unwrap(), None);

        headers.insert("Content-Length", " 42 ");
        assert_eq!(headers.content_length().unwrap(), Some(42));

        headers.insert("content-length", "0");
        assert_eq!(headers.content_length().unwrap(), Some(0));
    }

    #[test]
    fn test_invalid_content_length() {
        for bad in ["-1", "+5", "abc", "1 2", "", "99999999999999999999999999"] {
            let mut headers = Headers::new();
            headers.insert("content-length", bad);
            assert!(
                matches!(headers.content_length(), Err(Error::InvalidContentLength(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_request_with_body() {
        let request = b"POST /items HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method(), &Method::POST);
        assert_eq!(result.body, b"hello");
        assert_eq!(result.body_text().unwrap(), "hello");
        assert!(result.path_params.is_empty());
    }

    #[test]
    fn test_parse_request_without_content_length_has_empty_body() {
        let result = parse_request(b"GET /items\r\n\r\nignored").unwrap();
        assert!(result.body.is_empty());
    }

    #[test]
    fn test_parse_request_ignores_bytes_past_declared_length() {
        let result = parse_request(b"POST /x\r\nContent-Length: 2\r\n\r\nabcdef").unwrap();
        assert_eq!(result.body, b"ab");
    }

    #[test]
    fn test_parse_request_incomplete_body() {
        let result = parse_request(b"POST /x\r\nContent-Length: 5\r\n\r\nabc");
        assert!(matches!(result, Err(Error::IncompleteBody { expected: 5, received: 3 })));
    }

    #[test]
    fn test_parse_request_invalid_content_length() {
        let result = parse_request(b"POST /x\r\nContent-Length: five\r\n\r\n");
        assert!(matches!(result, Err(Error::InvalidContentLength(ref v)) if v == "five"));
    }

    #[test]
    fn test_parse_request_without_terminator() {
        let result = parse_request(b"GET /items HTTP/1.1\r\nHost: example.com").unwrap();
        assert_eq!(result.path(), "/items");
        assert_eq!(result.header("host"), Some("example.com"));
    }

    #[test]
    fn test_request_accessors() {
        let result = parse_request(b"GET /a?x=1 HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert!(result.has_header("HOST"));
        assert!(!result.has_header("accept"));
        assert!(result.has_query_param("x"));
        assert_eq!(result.query_param("x"), Some("1"));
        assert_eq!(result.query_param("y"), None);
        assert_eq!(result.path_param("id"), None);
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Item {
        name: String,
        count: u32,
    }

    #[test]
    fn test_json_body() {
        let body = serde_json::to_string(&Item { name: "lamp".to_string(), count: 3 }).unwrap();
        let raw = format!(
            "POST /items HTTP/1.1\r\nContent-Type: Application/JSON; charset=utf-8\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );

        let request = parse_request(raw.as_bytes()).unwrap();
        assert!(request.is_json());
        let item: Item = request.json().unwrap();
        assert_eq!(item, Item { name: "lamp".to_string(), count: 3 });
    }

    #[test]
    fn test_json_requires_content_type() {
        let request = parse_request(b"POST /items\r\nContent-Length: 2\r\n\r\n{}").unwrap();
        assert!(!request.is_json());
        let result: Result<serde_json::Value, Error> = request.json();
        assert!(matches!(result, Err(Error::MissingHeader(_))));
    }

    #[test]
    fn test_invalid_json_body() {
        let request = parse_request(
            b"POST /items\r\nContent-Type: application/json\r\nContent-Length: 3\r\n\r\n{x}",
        )
        .unwrap();
        let result: Result<Item, Error> = request.json();
        assert!(matches!(result, Err(Error::JsonError(_))));
    }
}
