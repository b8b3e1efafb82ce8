//! Expansion of `storage.trees` into files and links
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::schema::Tree;
use crate::error::ConfigError;
use crate::options::TranslateOptions;
use crate::path::Path;
use crate::report::Report;
use crate::resource::{data_url, render};
use crate::translation::TranslationSet;
use crate::util::files_dir::resolve_local;
use serde_json::{json, Map, Value};
use std::path::Path as FsPath;
use tracing::debug;
use walkdir::WalkDir;

/// Walk every tree and add its files and symlinks to `target`
///
/// Entries are visited in file name order. An explicit file without contents
/// (or link without target) at the same path is filled in; any other
/// collision is reported as `NodeExists` and the explicit entry kept.
/// Diagnostics and translations are anchored under `prefix`, the source path
/// of the config that holds `storage`.
pub fn translate_trees(
    trees: &[Tree],
    prefix: &Path,
    target: &mut Value,
    translations: &mut TranslationSet,
    report: &mut Report,
    options: &TranslateOptions,
) {
    for (i, tree) in trees.iter().enumerate() {
        let tree_path = prefix.append("storage").append("trees").append(i);
        if tree.local.is_empty() {
            continue;
        }
        let root = match resolve_local(options.files_dir.as_deref(), &tree.local) {
            Ok(root) => root,
            Err(err) => {
                report.add_error(tree_path.append("local"), err);
                continue;
            }
        };
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                report.add_error(tree_path.append("local"), ConfigError::TreeNotDirectory);
                continue;
            }
            Err(err) => {
                report.add_error(
                    tree_path.append("local"),
                    ConfigError::Io(format!("open {}: {}", root.display(), err)),
                );
                continue;
            }
        }

        let destination = tree.path.as_deref().unwrap_or("/");
        let mut expander = TreeExpander {
            target: &mut *target,
            translations: &mut *translations,
            report: &mut *report,
            options,
            tree_path: &tree_path,
        };
        expander.walk(&root, destination);
    }
}

struct TreeExpander<'a> {
    target: &'a mut Value,
    translations: &'a mut TranslationSet,
    report: &'a mut Report,
    options: &'a TranslateOptions,
    tree_path: &'a Path,
}

impl TreeExpander<'_> {
    fn walk(&mut self, root: &FsPath, destination: &str) {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.report
                        .add_error(self.tree_path.append("local"), ConfigError::Io(err.to_string()));
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let node_path = format!("{}/{}", destination.trim_end_matches('/'), relative.join("/"));

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            } else if file_type.is_file() {
                self.add_file(entry.path(), &node_path);
            } else if file_type.is_symlink() {
                self.add_link(entry.path(), &node_path);
            } else {
                self.report.add_error(self.tree_path.clone(), ConfigError::FileType);
            }
        }
    }

    fn add_file(&mut self, fs_path: &FsPath, node_path: &str) {
        if self.position("directories", node_path).is_some()
            || self.position("links", node_path).is_some()
        {
            self.report.add_error(self.tree_path.clone(), ConfigError::NodeExists);
            return;
        }
        let existing = self.position("files", node_path);
        if let Some(index) = existing {
            let has_contents = self.entry("files", index).and_then(|f| f.pointer("/contents/source")).is_some();
            if has_contents {
                self.report.add_error(self.tree_path.clone(), ConfigError::NodeExists);
                return;
            }
        }

        let data = match std::fs::read(fs_path) {
            Ok(data) => data,
            Err(err) => {
                self.report.add_error(
                    self.tree_path.append("local"),
                    ConfigError::Io(format!("open {}: {}", fs_path.display(), err)),
                );
                return;
            }
        };
        let data = match render(self.options, &fs_path.to_string_lossy(), data) {
            Ok(data) => data,
            Err(err) => {
                self.report.add_error(self.tree_path.append("local"), err);
                return;
            }
        };
        let encoded = match data_url::encode(&data, !self.options.no_resource_auto_compression) {
            Ok(encoded) => encoded,
            Err(err) => {
                self.report
                    .add_error(self.tree_path.append("local"), ConfigError::Io(err.to_string()));
                return;
            }
        };
        let mut contents = Map::new();
        contents.insert("source".into(), json!(encoded.url));
        if encoded.gzipped {
            contents.insert("compression".into(), json!("gzip"));
        }
        let mode = tree_file_mode(fs_path);

        match existing {
            Some(index) => {
                let to = Path::target("storage.files").append(index);
                let Some(Value::Object(file)) = self.entry_mut("files", index) else {
                    return;
                };
                let mut added = Map::new();
                added.insert("contents".into(), Value::Object(contents));
                if !file.contains_key("mode") {
                    added.insert("mode".into(), json!(mode));
                }
                for (key, value) in &added {
                    self.translations.add_from_common_source(
                        self.tree_path,
                        &to.append(key.as_str()),
                        value,
                    );
                }
                let Some(Value::Object(file)) = self.entry_mut("files", index) else {
                    return;
                };
                file.extend(added);
            }
            None => {
                let file = json!({
                    "path": node_path,
                    "contents": Value::Object(contents),
                    "mode": mode,
                });
                self.push("files", file);
            }
        }
        debug!(path = node_path, "added file from tree");
    }

    fn add_link(&mut self, fs_path: &FsPath, node_path: &str) {
        if self.position("files", node_path).is_some()
            || self.position("directories", node_path).is_some()
        {
            self.report.add_error(self.tree_path.clone(), ConfigError::NodeExists);
            return;
        }
        let link_target = match std::fs::read_link(fs_path) {
            Ok(target) => target.to_string_lossy().into_owned(),
            Err(err) => {
                self.report.add_error(
                    self.tree_path.append("local"),
                    ConfigError::Io(format!("readlink {}: {}", fs_path.display(), err)),
                );
                return;
            }
        };
        match self.position("links", node_path) {
            Some(index) => {
                let Some(Value::Object(link)) = self.entry_mut("links", index) else {
                    return;
                };
                if link.get("target").is_some() {
                    self.report.add_error(self.tree_path.clone(), ConfigError::NodeExists);
                    return;
                }
                link.insert("target".into(), json!(link_target));
                self.translations.add(
                    self.tree_path.clone(),
                    Path::target("storage.links").append(index).append("target"),
                );
            }
            None => self.push("links", json!({"path": node_path, "target": link_target})),
        }
    }

    fn list(&self, kind: &str) -> Option<&Vec<Value>> {
        self.target.get("storage")?.get(kind)?.as_array()
    }

    fn position(&self, kind: &str, node_path: &str) -> Option<usize> {
        self.list(kind)?
            .iter()
            .position(|node| node.get("path").and_then(Value::as_str) == Some(node_path))
    }

    fn entry(&self, kind: &str, index: usize) -> Option<&Value> {
        self.list(kind)?.get(index)
    }

    fn entry_mut(&mut self, kind: &str, index: usize) -> Option<&mut Value> {
        self.target
            .get_mut("storage")?
            .get_mut(kind)?
            .as_array_mut()?
            .get_mut(index)
    }

    /// Append a new node, creating and tracing any missing containers
    fn push(&mut self, kind: &str, node: Value) {
        if !self.target.is_object() {
            *self.target = json!({});
        }
        let storage_to = Path::target("storage");
        let list_to = storage_to.append(kind);
        if self.translations.lookup(&storage_to).is_none() {
            self.translations.add(self.tree_path.clone(), storage_to);
        }
        if self.translations.lookup(&list_to).is_none() {
            self.translations.add(self.tree_path.clone(), list_to.clone());
        }

        let Some(root) = self.target.as_object_mut() else {
            return;
        };
        let storage = root.entry("storage").or_insert_with(|| json!({}));
        let Some(storage) = storage.as_object_mut() else {
            return;
        };
        let list = storage.entry(kind).or_insert_with(|| json!([]));
        let Some(list) = list.as_array_mut() else {
            return;
        };
        let to = list_to.append(list.len());
        self.translations
            .add_from_common_source(self.tree_path, &to, &node);
        list.push(node);
    }
}

/// `0755` when any execute bit is set, `0644` otherwise
#[cfg(unix)]
fn tree_file_mode(path: &FsPath) -> i64 {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => 0o755,
        _ => 0o644,
    }
}

#[cfg(not(unix))]
fn tree_file_mode(_path: &FsPath) -> i64 {
    0o644
}
