//! Typed decoding of source configs
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::error::ConfigError;
use crate::path::{Path, Schema};
use crate::report::{Marker, Report};
use crate::yaml::Node;
use semver::Version;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Read only `variant` and `version` from a document
///
/// On failure returns the error together with the source path it belongs at.
pub fn decode_header(input: &[u8]) -> Result<(String, Version), (ConfigError, Path)> {
    let document: serde_yaml::Value = serde_yaml::from_slice(input)
        .map_err(|e| (ConfigError::Unmarshal(e.to_string()), Path::root(Schema::Source)))?;

    let variant = match document.get("variant") {
        Some(serde_yaml::Value::String(v)) if !v.is_empty() => v.clone(),
        _ => return Err((ConfigError::NoVariant, Path::source("variant"))),
    };
    let version = document
        .get("version")
        .and_then(scalar_text)
        .and_then(|text| Version::parse(&text).ok())
        .ok_or((ConfigError::InvalidVersion, Path::source("version")))?;
    Ok((variant, version))
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a document into `T`, reporting keys `T` does not use
///
/// Unknown keys are errors in strict mode and warnings otherwise. A decode
/// failure yields `None` and a fatal report.
pub fn decode<T>(input: &[u8], tree: &Node, strict: bool) -> (Option<T>, Report)
where
    T: DeserializeOwned + Serialize,
{
    let mut report = Report::new();
    let config: T = match serde_yaml::from_slice(input) {
        Ok(config) => config,
        Err(err) => {
            let marker = err
                .location()
                .map(|location| Marker::at(location.line(), location.column()));
            report.add_error(Path::root(Schema::Source), ConfigError::Unmarshal(err.to_string()));
            if let Some(entry) = report.entries.last_mut() {
                entry.marker = marker;
            }
            return (None, report);
        }
    };

    // Source types serialize every field, so a key present in the YAML but
    // absent here was never read.
    match serde_json::to_value(&config) {
        Ok(used) => find_unused(tree, &used, &Path::root(Schema::Source), strict, &mut report),
        Err(err) => report.add_error(
            Path::root(Schema::Source),
            ConfigError::Unmarshal(err.to_string()),
        ),
    }
    debug!(entries = report.len(), "decoded source config");
    (Some(config), report)
}

fn find_unused(node: &Node, used: &Value, path: &Path, strict: bool, report: &mut Report) {
    match (node, used) {
        (Node::Map { entries, .. }, Value::Object(object)) => {
            for entry in entries {
                let child_path = path.append(entry.key.as_str());
                match object.get(&entry.key) {
                    Some(child) => find_unused(&entry.value, child, &child_path, strict, report),
                    None => {
                        let err = ConfigError::UnusedKey(entry.key.clone());
                        if strict {
                            report.add_error(child_path, err);
                        } else {
                            report.add_warning(child_path, err);
                        }
                        if let Some(last) = report.entries.last_mut() {
                            last.marker = Some(entry.key_marker);
                        }
                    }
                }
            }
        }
        (Node::Sequence { items, .. }, Value::Array(values)) => {
            for (i, (item, value)) in items.iter().zip(values).enumerate() {
                find_unused(item, value, &path.append(i), strict, report);
            }
        }
        _ => {}
    }
}
