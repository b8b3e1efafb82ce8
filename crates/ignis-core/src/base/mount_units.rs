//! Mount and swap units for filesystems with `with_mount_unit: true`
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::schema::Filesystem;
use crate::path::Path;
use crate::translation::Translated;
use serde_json::{json, Value};

/// Build a `systemd.units` fragment for every filesystem that asks for one
///
/// The result is meant as a merge parent under the user's config, so a unit
/// the user writes with the same name replaces the generated one field by
/// field.
pub fn mount_units(filesystems: &[Filesystem], prefix: &Path) -> Translated<Value> {
    let mut result = Translated::new(json!({}));
    let mut units = Vec::new();

    for (i, fs) in filesystems.iter().enumerate() {
        if fs.with_mount_unit != Some(true) {
            continue;
        }
        let Some(format) = fs.format.as_deref().filter(|f| !f.is_empty()) else {
            continue;
        };
        let (name, contents) = if format == "swap" {
            (
                format!("{}.swap", systemd_escape_path(&fs.device)),
                swap_unit(fs),
            )
        } else {
            let Some(path) = fs.path.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            (
                format!("{}.mount", systemd_escape_path(path)),
                mount_unit(fs, path, format),
            )
        };

        let from = prefix
            .append("storage")
            .append("filesystems")
            .append(i)
            .append("with_mount_unit");
        let to = Path::target("systemd.units").append(units.len());
        let unit = json!({
            "name": name,
            "enabled": true,
            "contents": contents,
        });
        result.translations.add_from_common_source(&from, &to, &unit);
        result.translations.add(from.clone(), Path::target("systemd.units"));
        result.translations.add(from, Path::target("systemd"));
        units.push(unit);
    }

    if !units.is_empty() {
        result.value = json!({ "systemd": { "units": units } });
    }
    result
}

fn mount_unit(fs: &Filesystem, path: &str, format: &str) -> String {
    let device = systemd_escape_path(&fs.device);
    let mut unit = String::from("# Generated by Ignis\n[Unit]\n");
    unit.push_str(&format!("Requires=systemd-fsck@{}.service\n", device));
    unit.push_str(&format!("After=systemd-fsck@{}.service\n", device));
    unit.push_str("\n[Mount]\n");
    unit.push_str(&format!("Where={}\n", path));
    unit.push_str(&format!("What={}\n", fs.device));
    unit.push_str(&format!("Type={}\n", format));
    if !fs.mount_options.is_empty() {
        unit.push_str(&format!("Options={}\n", fs.mount_options.join(",")));
    }
    unit.push_str("\n[Install]\nRequiredBy=local-fs.target\n");
    unit
}

fn swap_unit(fs: &Filesystem) -> String {
    let mut unit = String::from("# Generated by Ignis\n[Swap]\n");
    unit.push_str(&format!("What={}\n", fs.device));
    if !fs.mount_options.is_empty() {
        unit.push_str(&format!("Options={}\n", fs.mount_options.join(",")));
    }
    unit.push_str("\n[Install]\nRequiredBy=swap.target\n");
    unit
}

/// Escape an absolute path the way `systemd-escape --path` does
pub fn systemd_escape_path(path: &str) -> String {
    let trimmed: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if trimmed.is_empty() {
        return "-".to_string();
    }
    let joined = trimmed.join("/");
    let mut out = String::with_capacity(joined.len());
    for (i, b) in joined.bytes().enumerate() {
        match b {
            b'/' => out.push('-'),
            b'.' if i == 0 => out.push_str("\\x2e"),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b':' | b'_' | b'.' => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}
