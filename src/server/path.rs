//! Path templates with named parameters.
//!
//! | Template        | Matches       | Captured    |
//! |-----------------|---------------|-------------|
//! | `/items`        | `/items`      | *(none)*    |
//! | `/items/:id`    | `/items/42`   | `id → "42"` |
//!
//! Both sides are compared on their non-empty `/`-separated segments, so
//! leading, trailing and doubled slashes do not affect matching.

use std::collections::HashMap;
use std::fmt;

/// Parameters captured from a path, keyed by name without the `:`.
pub type PathParams = HashMap<String, String>;

/// One segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the concrete segment exactly.
    Literal(String),
    /// Matches any concrete segment and captures it under this name.
    Param(String),
}

/// A registered route path such as `/items/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.trim().split('/').filter(|s| !s.is_empty())
}

impl PathTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = split_segments(template)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: template.to_string(),
            segments,
        }
    }

    /// The template as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match `path` against this template, returning the captured parameters.
    ///
    /// Parameters are only collected once every segment has matched; a
    /// partial match never yields a half-filled map.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let concrete: Vec<&str> = split_segments(path).collect();
        if concrete.len() != self.segments.len() {
            return None;
        }

        let all_match = self.segments.iter().zip(&concrete).all(|(seg, part)| match seg {
            Segment::Literal(lit) => lit == part,
            Segment::Param(_) => true,
        });
        if !all_match {
            return None;
        }

        let params = self
            .segments
            .iter()
            .zip(concrete)
            .filter_map(|(seg, part)| match seg {
                Segment::Param(name) => Some((name.clone(), part.to_string())),
                Segment::Literal(_) => None,
            })
            .collect();
        Some(params)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matches(path).is_some()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Match a concrete path against a template string in one call.
pub fn path_match(path: &str, template: &str) -> Option<PathParams> {
    PathTemplate::parse(template).matches(path)
}
