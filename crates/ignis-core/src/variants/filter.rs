//! Field-support filters over a produced target
//!
//! Some variants accept the full source schema but emit into a consumer that
//! only understands part of Ignition. A filter names target locations and
//! either rejects them or warns that they will be ignored.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::error::ConfigError;
use crate::path::{Path, PathPattern};
use crate::report::Report;
use crate::translation::set::is_empty_value;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Forbid,
    Warn,
}

/// One target location and what to do when it holds a value
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pattern: PathPattern,
    predicate: Option<fn(&Value) -> bool>,
    policy: Policy,
    error: ConfigError,
}

impl FieldFilter {
    /// Reject any non-empty value at `pattern`
    pub fn forbid(pattern: &str, error: ConfigError) -> Self {
        Self {
            pattern: PathPattern::new(pattern),
            predicate: None,
            policy: Policy::Forbid,
            error,
        }
    }

    /// Reject values at `pattern` for which `predicate` holds
    pub fn forbid_if(pattern: &str, predicate: fn(&Value) -> bool, error: ConfigError) -> Self {
        Self {
            predicate: Some(predicate),
            ..Self::forbid(pattern, error)
        }
    }

    /// Warn about any non-empty value at `pattern`
    pub fn warn(pattern: &str, error: ConfigError) -> Self {
        Self {
            policy: Policy::Warn,
            ..Self::forbid(pattern, error)
        }
    }

    fn applies(&self, path: &Path, value: &Value) -> bool {
        self.pattern.matches(path)
            && !is_empty_value(value)
            && self.predicate.map_or(true, |predicate| predicate(value))
    }
}

/// Check every node of `target` against `filters`
///
/// Findings are recorded at target paths below `root`, in document order.
pub fn apply_filters(filters: &[FieldFilter], target: &Value, root: &Path, report: &mut Report) {
    visit(filters, target, &Path::root(root.schema), root, report);
}

fn visit(filters: &[FieldFilter], value: &Value, path: &Path, root: &Path, report: &mut Report) {
    for filter in filters.iter().filter(|f| f.applies(path, value)) {
        let at = path.prefix(root);
        match filter.policy {
            Policy::Forbid => report.add_error(at, filter.error.clone()),
            Policy::Warn => report.add_warning(at, filter.error.clone()),
        }
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(filters, child, &path.append(key.as_str()), root, report);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                visit(filters, child, &path.append(i), root, report);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_forbid_warn_and_predicate() {
        let target = json!({
            "storage": {
                "directories": [{"path": "/a"}, {"path": "/b"}],
                "filesystems": [{"device": "/dev/vda", "format": "btrfs"}, {"device": "/dev/vdb", "format": "xfs"}],
                "links": []
            },
            "kernelArguments": {"shouldExist": ["quiet"]}
        });
        let filters = [
            FieldFilter::forbid("storage.directories.*", ConfigError::DirectorySupport),
            FieldFilter::forbid("storage.links.*", ConfigError::LinkSupport),
            FieldFilter::forbid_if(
                "storage.filesystems.*.format",
                |v| v == "btrfs",
                ConfigError::BtrfsSupport,
            ),
            FieldFilter::warn("kernelArguments", ConfigError::FieldElided),
        ];
        let mut report = Report::new();
        apply_filters(&filters, &target, &Path::target("spec.config"), &mut report);
        let found: Vec<(String, bool)> = report
            .iter()
            .map(|e| (e.path.to_string(), e.kind == crate::report::EntryKind::Error))
            .collect();
        assert_eq!(
            found,
            vec![
                ("$.spec.config.storage.directories.0".to_string(), true),
                ("$.spec.config.storage.directories.1".to_string(), true),
                ("$.spec.config.storage.filesystems.0.format".to_string(), true),
                ("$.spec.config.kernelArguments".to_string(), false),
            ]
        );
        assert!(report.iter().all(|e| e.path.schema == Schema::Target));
    }
}
