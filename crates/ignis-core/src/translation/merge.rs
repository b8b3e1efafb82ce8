//! Parent/child merging of target configs with provenance
//!
//! Objects merge key by key with the child winning. Lists whose entries have
//! a natural key (units by name, files by path and so on) merge matching
//! entries in the parent's position and append the child's remaining entries;
//! other lists concatenate. Every node of the result is traced back to the
//! node it came from so both translation sets can be rewritten onto the new
//! indices, child translations replacing parent ones where both apply.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::path::{Path, PathPattern, Schema};
use crate::translation::{Translated, TranslationSet};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
enum MergeKey {
    /// Entries are objects keyed by one field
    Field(&'static str),
    /// Partitions: by label, else by number
    Partition,
    /// Entries are scalars keyed by their own value
    Scalar,
}

fn keyed_lists() -> &'static [(PathPattern, MergeKey)] {
    static TABLE: OnceLock<Vec<(PathPattern, MergeKey)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            ("storage.disks", MergeKey::Field("device")),
            ("storage.disks.*.partitions", MergeKey::Partition),
            ("storage.raid", MergeKey::Field("name")),
            ("storage.filesystems", MergeKey::Field("device")),
            ("storage.luks", MergeKey::Field("name")),
            ("storage.files", MergeKey::Field("path")),
            ("storage.directories", MergeKey::Field("path")),
            ("storage.links", MergeKey::Field("path")),
            ("systemd.units", MergeKey::Field("name")),
            ("systemd.units.*.dropins", MergeKey::Field("name")),
            ("passwd.users", MergeKey::Field("name")),
            ("passwd.groups", MergeKey::Field("name")),
            ("kernelArguments.shouldExist", MergeKey::Scalar),
            ("kernelArguments.shouldNotExist", MergeKey::Scalar),
        ]
        .into_iter()
        .map(|(pattern, key)| (PathPattern::new(pattern), key))
        .collect()
    })
}

fn merge_key_for(path: &Path) -> Option<MergeKey> {
    keyed_lists()
        .iter()
        .find(|(pattern, _)| pattern.matches(path))
        .map(|(_, key)| *key)
}

fn entry_key(kind: MergeKey, entry: &Value) -> Option<String> {
    match kind {
        MergeKey::Field(field) => entry.get(field).and_then(Value::as_str).map(str::to_string),
        MergeKey::Partition => match entry.get("label").and_then(Value::as_str) {
            Some(label) => Some(format!("label:{}", label)),
            None => entry
                .get("number")
                .and_then(Value::as_i64)
                .filter(|n| *n != 0)
                .map(|n| format!("number:{}", n)),
        },
        MergeKey::Scalar => match entry {
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::Object(_) | Value::Array(_) => None,
            other => Some(other.to_string()),
        },
    }
}

/// Where each node of the merged document came from
#[derive(Default)]
struct Transcript {
    parent: HashMap<Path, Path>,
    child: HashMap<Path, Path>,
}

#[derive(Clone, Copy)]
enum Side {
    Parent,
    Child,
}

impl Transcript {
    fn record(&mut self, side: Side, value: &Value, old: &Path, new: &Path) {
        let map = match side {
            Side::Parent => &mut self.parent,
            Side::Child => &mut self.child,
        };
        map.insert(old.clone(), new.clone());
        match value {
            Value::Object(object) => {
                for (key, child) in object {
                    self.record(side, child, &old.append(key.as_str()), &new.append(key.as_str()));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    self.record(side, child, &old.append(i), &new.append(i));
                }
            }
            _ => {}
        }
    }
}

/// Merge `child` over `parent`, carrying both translation sets to the
/// merged paths; reports are concatenated parent first
pub fn merge_translated(parent: Translated<Value>, child: Translated<Value>) -> Translated<Value> {
    let root = Path::root(Schema::Target);
    let mut transcript = Transcript::default();
    let value = merge_values(&parent.value, &child.value, &root, &root, &root, &mut transcript);

    let mut translations =
        TranslationSet::new(parent.translations.from_tag(), parent.translations.to_tag());
    for translation in parent.translations.iter() {
        if let Some(new) = transcript.parent.get(&translation.to) {
            translations.add(translation.from.clone(), new.clone());
        }
    }
    for translation in child.translations.iter() {
        if let Some(new) = transcript.child.get(&translation.to) {
            translations.add(translation.from.clone(), new.clone());
        }
    }

    let mut report = parent.report;
    report.merge(child.report);
    Translated {
        value,
        translations,
        report,
    }
}

fn merge_values(
    parent: &Value,
    child: &Value,
    parent_path: &Path,
    child_path: &Path,
    new: &Path,
    transcript: &mut Transcript,
) -> Value {
    match (parent, child) {
        (_, Value::Null) => {
            transcript.record(Side::Parent, parent, parent_path, new);
            parent.clone()
        }
        (Value::Object(p), Value::Object(c)) => {
            transcript.parent.insert(parent_path.clone(), new.clone());
            transcript.child.insert(child_path.clone(), new.clone());
            let mut out = Map::new();
            for (key, pv) in p {
                let key_new = new.append(key.as_str());
                let key_parent = parent_path.append(key.as_str());
                let merged = match c.get(key) {
                    Some(cv) => merge_values(
                        pv,
                        cv,
                        &key_parent,
                        &child_path.append(key.as_str()),
                        &key_new,
                        transcript,
                    ),
                    None => {
                        transcript.record(Side::Parent, pv, &key_parent, &key_new);
                        pv.clone()
                    }
                };
                out.insert(key.clone(), merged);
            }
            for (key, cv) in c.iter().filter(|(k, _)| !p.contains_key(*k)) {
                transcript.record(
                    Side::Child,
                    cv,
                    &child_path.append(key.as_str()),
                    &new.append(key.as_str()),
                );
                out.insert(key.clone(), cv.clone());
            }
            Value::Object(out)
        }
        (Value::Array(p), Value::Array(c)) => {
            transcript.parent.insert(parent_path.clone(), new.clone());
            transcript.child.insert(child_path.clone(), new.clone());
            Value::Array(merge_lists(p, c, parent_path, child_path, new, transcript))
        }
        _ => {
            transcript.record(Side::Child, child, child_path, new);
            child.clone()
        }
    }
}

fn merge_lists(
    parent: &[Value],
    child: &[Value],
    parent_path: &Path,
    child_path: &Path,
    new: &Path,
    transcript: &mut Transcript,
) -> Vec<Value> {
    let mut out = Vec::with_capacity(parent.len() + child.len());
    let mut used = HashSet::new();
    let key_kind = merge_key_for(new);

    for (i, pv) in parent.iter().enumerate() {
        let slot = new.append(out.len());
        let matched = key_kind.and_then(|kind| {
            let key = entry_key(kind, pv)?;
            child
                .iter()
                .enumerate()
                .find(|(j, cv)| !used.contains(j) && entry_key(kind, cv).as_ref() == Some(&key))
                .map(|(j, _)| j)
        });
        match matched {
            Some(j) => {
                used.insert(j);
                out.push(merge_values(
                    pv,
                    &child[j],
                    &parent_path.append(i),
                    &child_path.append(j),
                    &slot,
                    transcript,
                ));
            }
            None => {
                transcript.record(Side::Parent, pv, &parent_path.append(i), &slot);
                out.push(pv.clone());
            }
        }
    }
    for (j, cv) in child.iter().enumerate() {
        if used.contains(&j) {
            continue;
        }
        let slot = new.append(out.len());
        transcript.record(Side::Child, cv, &child_path.append(j), &slot);
        out.push(cv.clone());
    }
    out
}
