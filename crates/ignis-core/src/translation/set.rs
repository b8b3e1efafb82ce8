//! Translation sets: provenance from target paths back to source paths
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::path::{Path, Schema};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One source path that produced one target path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Translation {
    pub from: Path,
    pub to: Path,
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {} {}", self.from.schema, self.from, self.to.schema, self.to)
    }
}

/// A set of translations, unique on the target path
///
/// Every path added must carry the set's schema tags; mixing them up is a
/// programming error and panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSet {
    from_tag: Schema,
    to_tag: Schema,
    set: BTreeMap<Path, Translation>,
}

impl Default for TranslationSet {
    fn default() -> Self {
        Self::new(Schema::Source, Schema::Target)
    }
}

impl TranslationSet {
    pub fn new(from_tag: Schema, to_tag: Schema) -> Self {
        Self {
            from_tag,
            to_tag,
            set: BTreeMap::new(),
        }
    }

    pub fn from_tag(&self) -> Schema {
        self.from_tag
    }

    pub fn to_tag(&self) -> Schema {
        self.to_tag
    }

    /// Record that `to` came from `from`, replacing any earlier mapping for `to`
    pub fn add(&mut self, from: Path, to: Path) {
        assert_eq!(
            from.schema, self.from_tag,
            "translation source {} has the wrong schema",
            from
        );
        assert_eq!(
            to.schema, self.to_tag,
            "translation target {} has the wrong schema",
            to
        );
        self.set.insert(to.clone(), Translation { from, to });
    }

    pub fn add_translation(&mut self, translation: Translation) {
        self.add(translation.from, translation.to);
    }

    /// Record that every path in `to_paths` came from `from`
    pub fn add_from_common<I>(&mut self, from: &Path, to_paths: I)
    where
        I: IntoIterator<Item = Path>,
    {
        for to in to_paths {
            self.add(from.clone(), to);
        }
    }

    /// Record that `to_prefix` and every non-null node beneath it in `value`
    /// came from `from`
    pub fn add_from_common_source(&mut self, from: &Path, to_prefix: &Path, value: &Value) {
        if value.is_null() {
            return;
        }
        self.add(from.clone(), to_prefix.clone());
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.add_from_common_source(from, &to_prefix.append(key.as_str()), child);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    self.add_from_common_source(from, &to_prefix.append(i), child);
                }
            }
            _ => {}
        }
    }

    /// Disjoint union; on collision the mapping from `other` wins
    pub fn merge(&mut self, other: TranslationSet) {
        for (_, translation) in other.set {
            self.add_translation(translation);
        }
    }

    /// Keep only translations whose target lies under `to_prefix`, with the
    /// prefix stripped
    pub fn descend(&self, to_prefix: &Path) -> TranslationSet {
        let mut result = TranslationSet::new(self.from_tag, self.to_tag);
        for translation in self.set.values() {
            if let Some(to) = translation.to.descend(to_prefix) {
                result.add(translation.from.clone(), to);
            }
        }
        result
    }

    /// Prepend `from_prefix` to every source path and `to_prefix` to every
    /// target path
    pub fn prefix_paths(&self, from_prefix: &Path, to_prefix: &Path) -> TranslationSet {
        let mut result = TranslationSet::new(from_prefix.schema, to_prefix.schema);
        for translation in self.set.values() {
            result.add(
                translation.from.prefix(from_prefix),
                translation.to.prefix(to_prefix),
            );
        }
        result
    }

    pub fn lookup(&self, to: &Path) -> Option<&Translation> {
        self.set.get(to)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Translation> {
        self.set.values()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Check that every non-empty node of `value` has a translation
    ///
    /// Returns the uncovered target paths in document order.
    pub fn debug_verify_coverage(&self, value: &Value) -> Result<(), Vec<Path>> {
        let mut missing = Vec::new();
        self.verify_node(value, &Path::root(self.to_tag), &mut missing);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    fn verify_node(&self, value: &Value, path: &Path, missing: &mut Vec<Path>) {
        if is_empty_value(value) {
            return;
        }
        if !path.is_empty() && !self.set.contains_key(path) {
            missing.push(path.clone());
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.verify_node(child, &path.append(key.as_str()), missing);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    self.verify_node(child, &path.append(i), missing);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for TranslationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "from {} to {}", self.from_tag, self.to_tag)?;
        for translation in self.set.values() {
            writeln!(f, "  {} -> {}", translation.from, translation.to)?;
        }
        Ok(())
    }
}

/// Null, empty strings and empty containers carry no content
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_replaces_prior_mapping() {
        let mut ts = TranslationSet::default();
        ts.add(Path::source("a"), Path::target("x"));
        ts.add(Path::source("b"), Path::target("x"));
        assert_eq!(ts.len(), 1);
        assert_eq!(ts.lookup(&Path::target("x")).unwrap().from, Path::source("b"));
    }

    #[test]
    #[should_panic(expected = "wrong schema")]
    fn test_tag_mismatch_panics() {
        let mut ts = TranslationSet::default();
        ts.add(Path::target("a"), Path::target("x"));
    }

    #[test]
    fn test_merge_other_wins() {
        let mut parent = TranslationSet::default();
        parent.add(Path::source("p.a"), Path::target("a"));
        parent.add(Path::source("p.b"), Path::target("b"));
        let mut child = TranslationSet::default();
        child.add(Path::source("c.b"), Path::target("b"));
        parent.merge(child);
        assert_eq!(parent.lookup(&Path::target("a")).unwrap().from, Path::source("p.a"));
        assert_eq!(parent.lookup(&Path::target("b")).unwrap().from, Path::source("c.b"));
    }

    #[test]
    fn test_descend_and_prefix_paths() {
        let mut ts = TranslationSet::default();
        ts.add(Path::source("version"), Path::target("apiVersion"));
        ts.add(Path::source("storage"), Path::target("spec.config.storage"));
        let inner = ts.descend(&Path::target("spec.config"));
        assert_eq!(inner.len(), 1);
        assert_eq!(
            inner.lookup(&Path::target("storage")).unwrap().from,
            Path::source("storage")
        );

        let outer = inner.prefix_paths(&Path::source("boot_device"), &Path::target("spec"));
        assert!(outer.lookup(&Path::target("spec.storage")).is_some());
        assert_eq!(
            outer.lookup(&Path::target("spec.storage")).unwrap().from,
            Path::source("boot_device.storage")
        );
    }

    #[test]
    fn test_add_from_common_source_covers_value() {
        let value = json!({"name": "root", "devices": ["/dev/a", "/dev/b"], "options": []});
        let mut ts = TranslationSet::default();
        ts.add_from_common_source(
            &Path::source("boot_device.mirror"),
            &Path::target("storage.raid.0"),
            &value,
        );
        assert!(ts.lookup(&Path::target("storage.raid.0.devices.1")).is_some());
        assert!(ts
            .debug_verify_coverage(&json!({"storage": {"raid": [value]}}))
            .unwrap_err()
            .contains(&Path::target("storage")));
    }

    #[test]
    fn test_coverage_skips_empty_nodes() {
        let mut ts = TranslationSet::default();
        ts.add(Path::source("a"), Path::target("a"));
        let value = json!({"a": 1, "b": "", "c": {}, "d": null, "e": []});
        assert!(ts.debug_verify_coverage(&value).is_ok());

        let value = json!({"a": 1, "f": false});
        assert_eq!(ts.debug_verify_coverage(&value), Err(vec![Path::target("f")]));
    }
}
