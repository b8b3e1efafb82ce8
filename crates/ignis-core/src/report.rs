//! Diagnostics reports
//!
//! A [`Report`] is an ordered list of errors and warnings, each anchored at a
//! [`Path`]. Findings are recorded where they are discovered, usually against
//! a source path but sometimes against a target path; line correlation later
//! rewrites target paths to source paths and attaches YAML markers.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::path::{Path, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Error,
    Warning,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Error => write!(f, "error"),
            EntryKind::Warning => write!(f, "warning"),
        }
    }
}

/// A YAML source location, 1-based
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Marker {
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub message: String,
    pub path: Path,
    pub marker: Option<Marker>,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.path)?;
        if let Some(marker) = &self.marker {
            write!(f, ", line {} col {}", marker.start_line, marker.start_column)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<Entry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error<M: fmt::Display>(&mut self, path: Path, message: M) {
        self.push(EntryKind::Error, path, message);
    }

    pub fn add_warning<M: fmt::Display>(&mut self, path: Path, message: M) {
        self.push(EntryKind::Warning, path, message);
    }

    /// Record `result`'s error as an error entry; no-op on `Ok`
    pub fn add_on_error<E: fmt::Display>(&mut self, path: Path, result: Result<(), E>) {
        if let Err(err) = result {
            self.add_error(path, err);
        }
    }

    /// Record `result`'s error as a warning entry; no-op on `Ok`
    pub fn add_on_warn<E: fmt::Display>(&mut self, path: Path, result: Result<(), E>) {
        if let Err(err) = result {
            self.add_warning(path, err);
        }
    }

    fn push<M: fmt::Display>(&mut self, kind: EntryKind, path: Path, message: M) {
        self.entries.push(Entry {
            kind,
            message: message.to_string(),
            path,
            marker: None,
        });
    }

    /// Append every entry of `other`, preserving order
    pub fn merge(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    /// Whether any entry is an error
    pub fn is_fatal(&self) -> bool {
        self.entries.iter().any(|e| e.kind == EntryKind::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|e| e.kind == EntryKind::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }

    /// Prepend `prefix` to every entry whose path is in `prefix`'s schema
    pub fn prefix_paths(&mut self, prefix: &Path) {
        for entry in &mut self.entries {
            if entry.path.schema == prefix.schema {
                entry.path = entry.path.prefix(prefix);
            }
        }
    }

    /// Entries still anchored in the target document
    pub fn target_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.path.schema == Schema::Target)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl IntoIterator for Report {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
