//! Request header map.

use std::collections::HashMap;

use crate::parser::error::Error;

/// Request headers keyed by lower-cased name.
///
/// Both names and values are stored trimmed and lower-cased, so
/// `Content-Type: Application/JSON` is held as `content-type` →
/// `application/json`. A repeated name overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one `name: value` header line and stores it.
    ///
    /// The line is split on the first `:`, so values may themselves contain
    /// colons (`host: localhost:8080`).
    pub(crate) fn insert_line(&mut self, line: &str) -> Result<(), Error> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::MalformedHeader(line.to_string()))?;
        self.insert(name, value);
        Ok(())
    }

    /// Stores a header, normalising name and value.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.inner
            .insert(name.trim().to_ascii_lowercase(), value.trim().to_lowercase());
    }

    /// Returns the value for `name`, looked up case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true if the header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The declared body length.
    ///
    /// Returns `Ok(None)` when the header is absent. A present value must be a
    /// plain run of ASCII digits that fits in `usize`; signs, whitespace inside
    /// the number and overflow are all rejected.
    pub fn content_length(&self) -> Result<Option<usize>, Error> {
        let Some(raw) = self.get("content-length") else {
            return Ok(None);
        };

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidContentLength(raw.to_string()));
        }

        raw.parse::<usize>()
            .map(Some)
            .map_err(|_| Error::InvalidContentLength(raw.to_string()))
    }
}
