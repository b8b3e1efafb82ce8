//! Mapping diagnostics back to the source document
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::path::Schema;
use crate::report::Report;
use crate::translation::TranslationSet;
use crate::yaml::Node;
use tracing::debug;

/// Rewrite every target-anchored entry to the source path that produced it
///
/// Entries whose target path has no translation keep their target path.
pub fn translate_report_paths(report: &mut Report, translations: &TranslationSet) {
    for entry in report.iter_mut() {
        if entry.path.schema != Schema::Target {
            continue;
        }
        match translations.lookup(&entry.path) {
            Some(translation) => entry.path = translation.from.clone(),
            None => debug!(path = %entry.path, "no translation for report entry"),
        }
    }
}

/// Attach a line and column to every source entry that lacks one
pub fn correlate_markers(tree: &Node, report: &mut Report) {
    for entry in report.iter_mut() {
        if entry.marker.is_none() && entry.path.schema == Schema::Source {
            entry.marker = Some(tree.marker_for(&entry.path));
        }
    }
}
