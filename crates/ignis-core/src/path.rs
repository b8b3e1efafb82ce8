//! Schema-tagged paths into source (YAML) and target (JSON) documents
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which document a path points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Schema {
    /// The user-authored YAML config
    Source,
    /// The generated JSON config
    Target,
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Source => write!(f, "source"),
            Schema::Target => write!(f, "target"),
        }
    }
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// An ordered sequence of segments tagged with the schema it belongs to
///
/// Paths order first by schema, then segment by segment, so a parent always
/// sorts directly before its children.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path {
    pub schema: Schema,
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn new<I, S>(schema: Schema, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        Self {
            schema,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The document root
    pub fn root(schema: Schema) -> Self {
        Self {
            schema,
            segments: Vec::new(),
        }
    }

    /// Parse a dotted path such as `storage.files.0.path`
    ///
    /// Segments made only of ASCII digits become indices. An empty string or
    /// `$` yields the root.
    pub fn parse(schema: Schema, dotted: &str) -> Self {
        let trimmed = dotted.strip_prefix('$').unwrap_or(dotted);
        let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Self::root(schema);
        }
        let segments = trimmed
            .split('.')
            .map(|s| match s.parse::<usize>() {
                Ok(index) if s.bytes().all(|b| b.is_ascii_digit()) => Segment::Index(index),
                _ => Segment::Key(s.to_string()),
            })
            .collect();
        Self { schema, segments }
    }

    /// Convenience for a source path
    pub fn source(dotted: &str) -> Self {
        Self::parse(Schema::Source, dotted)
    }

    /// Convenience for a target path
    pub fn target(dotted: &str) -> Self {
        Self::parse(Schema::Target, dotted)
    }

    /// A new path with one more segment
    pub fn append<S: Into<Segment>>(&self, segment: S) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self {
            schema: self.schema,
            segments,
        }
    }

    /// A new path with every segment of `other` appended
    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self {
            schema: self.schema,
            segments,
        }
    }

    /// Strip `prefix`, returning the remainder, or `None` if absent
    pub fn descend(&self, prefix: &Path) -> Option<Path> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(Self {
            schema: self.schema,
            segments: self.segments[prefix.segments.len()..].to_vec(),
        })
    }

    /// A new path with `prefix` prepended; the schema of `prefix` wins
    pub fn prefix(&self, prefix: &Path) -> Self {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        Self {
            schema: prefix.schema,
            segments,
        }
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.schema == prefix.schema && self.segments.starts_with(&prefix.segments)
    }

    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            schema: self.schema,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The same segments tagged with another schema
    pub fn with_schema(&self, schema: Schema) -> Self {
        Self {
            schema,
            segments: self.segments.clone(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// A path template where `*` matches any sequence index
///
/// Used to key translator overrides, merge rules and field filters by
/// location without caring which list entry is being visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    parts: Vec<PatternPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternPart {
    Key(String),
    AnyIndex,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let parts = if pattern.is_empty() {
            Vec::new()
        } else {
            pattern
                .split('.')
                .map(|s| match s {
                    "*" => PatternPart::AnyIndex,
                    key => PatternPart::Key(key.to_string()),
                })
                .collect()
        };
        Self { parts }
    }

    /// Whether `path` matches the pattern exactly (same length)
    pub fn matches(&self, path: &Path) -> bool {
        self.parts.len() == path.segments.len() && self.matches_prefix(path)
    }

    /// Whether the pattern matches the first segments of `path`
    pub fn matches_prefix(&self, path: &Path) -> bool {
        path.segments.len() >= self.parts.len()
            && self
                .parts
                .iter()
                .zip(&path.segments)
                .all(|(part, segment)| match (part, segment) {
                    (PatternPart::Key(k), Segment::Key(s)) => k == s,
                    (PatternPart::AnyIndex, Segment::Index(_)) => true,
                    _ => false,
                })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .parts
            .iter()
            .map(|p| match p {
                PatternPart::Key(k) => k.as_str(),
                PatternPart::AnyIndex => "*",
            })
            .collect();
        write!(f, "{}", parts.join("."))
    }
}
