//! YAML tree with per-node source markers
//!
//! Typed decoding goes through `serde_yaml`, which forgets where values came
//! from. This module keeps a second, untyped view of the same document built
//! with `marked-yaml` so diagnostics can point at a line and column. Map
//! entries remember the marker of the key separately from the value, which
//! lets an error about `foo` point at the `foo:` token.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod decode;

pub use decode::{decode, decode_header};

use crate::path::{Path, Segment};
use crate::report::Marker;
use tracing::debug;

/// A parsed YAML node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A scalar; `None` for YAML null
    Leaf { value: Option<String>, marker: Marker },
    Map { entries: Vec<MapEntry>, marker: Marker },
    Sequence { items: Vec<Node>, marker: Marker },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub key: String,
    pub key_marker: Marker,
    pub value: Node,
}

impl Default for Node {
    fn default() -> Self {
        Node::Map {
            entries: Vec::new(),
            marker: Marker::at(1, 1),
        }
    }
}

impl Node {
    /// Parse a document; the top level must be a mapping
    pub fn parse(input: &str) -> Result<Node, String> {
        let root = marked_yaml::parse_yaml(0, input).map_err(|e| e.to_string())?;
        let lines: Vec<&str> = input.lines().collect();
        match Self::convert(&root, Marker::at(1, 1), &lines) {
            map @ Node::Map { .. } => Ok(map),
            _ => Err("top level of the document must be a mapping".to_string()),
        }
    }

    /// Parse a document, falling back to an empty map when the input is not
    /// a well-formed YAML mapping
    ///
    /// The marker parser is stricter than the typed decoder (anchors and
    /// aliases are rejected), so a document can decode fine while its
    /// diagnostics carry no line and column.
    pub fn parse_or_empty(input: &[u8]) -> Node {
        let parsed = std::str::from_utf8(input)
            .map_err(|e| e.to_string())
            .and_then(Self::parse);
        match parsed {
            Ok(node) => node,
            Err(error) => {
                debug!(%error, "no source markers available; diagnostics will lack line and column");
                Node::default()
            }
        }
    }

    fn convert(node: &marked_yaml::Node, fallback: Marker, lines: &[&str]) -> Node {
        let marker = span_marker(node.span(), fallback);
        match node {
            marked_yaml::Node::Scalar(scalar) => {
                let text = scalar.as_str();
                let marker = scalar_extent(marker, text, lines);
                let value = match text {
                    "" | "~" | "null" | "Null" | "NULL" => None,
                    _ => Some(text.to_string()),
                };
                Node::Leaf { value, marker }
            }
            marked_yaml::Node::Mapping(mapping) => Node::Map {
                entries: mapping
                    .iter()
                    .map(|(key, value)| {
                        let key_marker =
                            scalar_extent(span_marker(key.span(), marker), key.as_str(), lines);
                        MapEntry {
                            key: key.as_str().to_string(),
                            key_marker,
                            value: Self::convert(value, key_marker, lines),
                        }
                    })
                    .collect(),
                marker,
            },
            marked_yaml::Node::Sequence(sequence) => Node::Sequence {
                items: sequence
                    .iter()
                    .map(|item| Self::convert(item, marker, lines))
                    .collect(),
                marker,
            },
        }
    }

    pub fn marker(&self) -> Marker {
        match self {
            Node::Leaf { marker, .. } | Node::Map { marker, .. } | Node::Sequence { marker, .. } => {
                *marker
            }
        }
    }

    /// Look up a key of a map node
    pub fn get(&self, key: &str) -> Option<&MapEntry> {
        match self {
            Node::Map { entries, .. } => entries.iter().find(|e| e.key == key),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Leaf { value: None, .. })
    }

    /// The marker a diagnostic at `path` should carry
    ///
    /// A non-null scalar yields its own marker. A map, sequence or null yields
    /// the marker of the key that holds it. When the path does not fully
    /// resolve, the deepest node that does resolve is used.
    pub fn marker_for(&self, path: &Path) -> Marker {
        let mut node = self;
        let mut holder = self.marker();
        for segment in &path.segments {
            let next = match (node, segment) {
                (Node::Map { entries, .. }, Segment::Key(key)) => entries
                    .iter()
                    .find(|e| &e.key == key)
                    .map(|e| (&e.value, e.key_marker)),
                (Node::Sequence { items, .. }, Segment::Index(i)) => {
                    items.get(*i).map(|item| (item, item.marker()))
                }
                _ => None,
            };
            match next {
                Some((child, marker)) => {
                    node = child;
                    holder = marker;
                }
                None => break,
            }
        }
        match node {
            Node::Leaf { value: Some(_), marker } => *marker,
            _ => holder,
        }
    }
}

fn span_marker(span: &marked_yaml::Span, fallback: Marker) -> Marker {
    let Some(start) = span.start() else {
        return fallback;
    };
    let (end_line, end_column) = span
        .end()
        .map(|end| (end.line(), end.column()))
        .unwrap_or((start.line(), start.column()));
    Marker {
        start_line: start.line(),
        start_column: start.column(),
        end_line,
        end_column,
    }
}

/// Widen a scalar marker that only has a start to cover the scalar's text
///
/// Single-line plain and quoted scalars are measured on the source line.
/// Block and multi-line scalars keep the start position.
fn scalar_extent(marker: Marker, text: &str, lines: &[&str]) -> Marker {
    if marker.end_line != marker.start_line || marker.end_column != marker.start_column {
        return marker;
    }
    let Some(line) = marker
        .start_line
        .checked_sub(1)
        .and_then(|index| lines.get(index))
    else {
        return marker;
    };
    let rest: Vec<char> = line.chars().skip(marker.start_column.saturating_sub(1)).collect();
    let width = match rest.first() {
        Some(&quote @ ('\'' | '"')) => match closing_quote(&rest, quote) {
            Some(i) => i + 1,
            None => return marker,
        },
        Some('|' | '>') | None => return marker,
        Some(_) if text.contains('\n') => return marker,
        Some(_) => text.chars().count(),
    };
    if width > rest.len() {
        return marker;
    }
    Marker {
        end_column: marker.start_column + width,
        ..marker
    }
}

/// Index of the quote closing the scalar that opens at `chars[0]`
fn closing_quote(chars: &[char], quote: char) -> Option<usize> {
    let mut i = 1;
    while i < chars.len() {
        match chars[i] {
            '\\' if quote == '"' => i += 1,
            '\'' if quote == '\'' && chars.get(i + 1) == Some(&'\'') => i += 1,
            c if c == quote => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}
