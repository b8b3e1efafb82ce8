//! Shared test support utilities for integration tests

#![allow(dead_code)]

use ignis_core::translation::Translated;
use ignis_core::variants::{fcos, lookup, SourceConfig};
use ignis_core::{translate_bytes, Document, Result, TranslateBytesOptions, TranslateOptions, Transpiled};
use semver::Version;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Run the bytes facade with default options
pub fn transpile(yaml: &str) -> Result<Transpiled> {
    translate_bytes(yaml.as_bytes(), &TranslateBytesOptions::default())
}

/// Run the bytes facade with a files directory
pub fn transpile_in(yaml: &str, dir: &TempDir) -> Result<Transpiled> {
    let options = TranslateBytesOptions {
        translate: TranslateOptions::default().with_files_dir(dir.path()),
        ..Default::default()
    };
    translate_bytes(yaml.as_bytes(), &options)
}

pub fn output_json(transpiled: &Transpiled) -> Value {
    serde_json::from_slice(&transpiled.output).expect("output is JSON")
}

/// Decode an fcos 1.5.0 document and translate it without the facade, so
/// the translation set stays visible
pub fn translate_fcos(yaml: &str, options: &TranslateOptions) -> Translated<Option<Document>> {
    let spec = lookup("fcos", &Version::new(1, 5, 0)).expect("fcos 1.5.0 is registered");
    let config: fcos::Config = serde_yaml::from_str(yaml).expect("valid fcos document");
    assert!(config.validate(spec).is_empty());
    config.translate(spec, options, false)
}

/// A temporary files directory populated with `files`
pub fn files_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, contents).expect("write fixture");
    }
    dir
}
