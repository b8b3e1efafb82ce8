//! Bytes-in, bytes-out transpilation
//!
//! [`translate_bytes`] is the public entry point: it reads the variant and
//! version from a YAML document, dispatches to the matching translator and
//! returns serialized JSON together with every diagnostic found on the way.
//! Diagnostics are anchored to YAML line and column where the source has one.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::error::{ConfigError, Error, Result};
use crate::options::TranslateBytesOptions;
use crate::path::Path;
use crate::report::Report;
use crate::translation::{correlate_markers, translate_report_paths};
use crate::variants::{lookup, SourceConfig, VariantSpec};
use crate::yaml::{decode, decode_header, Node};
use tracing::{debug, instrument, trace, warn};

/// Serialized output and the diagnostics collected while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Transpiled {
    pub output: Vec<u8>,
    pub report: Report,
}

/// Translate a YAML source config into Ignition (or MachineConfig) JSON
///
/// Warnings never block output. Any error in the report, or any entry at all
/// in strict mode, turns into an [`Error`] carrying the full report.
pub fn translate_bytes(input: &[u8], options: &TranslateBytesOptions) -> Result<Transpiled> {
    let tree = Node::parse_or_empty(input);
    let (variant, version) = match decode_header(input) {
        Ok(header) => header,
        Err((kind, path)) => return Err(dispatch_error(kind, path, &tree)),
    };
    let spec = lookup(&variant, &version)
        .map_err(|kind| dispatch_error(kind, Path::source("version"), &tree))?;
    debug!(variant = %spec.variant, version = %spec.version, target = %spec.target, "dispatching");
    spec.translate(input, &tree, options)
}

fn dispatch_error(kind: ConfigError, path: Path, tree: &Node) -> Error {
    let mut report = Report::new();
    report.add_error(path, kind.clone());
    correlate_markers(tree, &mut report);
    Error::Dispatch { kind, report }
}

/// The full pipeline for one source config type
#[instrument(skip_all, fields(variant = spec.variant, version = %spec.version))]
pub(crate) fn translate_source<C: SourceConfig>(
    spec: &VariantSpec,
    input: &[u8],
    tree: &Node,
    options: &TranslateBytesOptions,
) -> Result<Transpiled> {
    let (config, mut report) = decode::<C>(input, tree, options.strict);
    let Some(config) = config else {
        return Err(source_error(report, tree));
    };
    report.merge(config.validate(spec));
    if report.is_fatal() {
        return Err(source_error(report, tree));
    }

    let translated = config.translate(spec, &options.translate, options.raw);
    report.merge(translated.report);
    let translations = translated.translations;
    let Some(document) = translated.value else {
        translate_report_paths(&mut report, &translations);
        return Err(source_error(report, tree));
    };
    if options.translate.debug_print_translations {
        trace!("translations:\n{}", translations);
    }
    if report.is_fatal() {
        translate_report_paths(&mut report, &translations);
        return Err(source_error(report, tree));
    }

    let target_report = document.validate();
    let generated_invalid = target_report.is_fatal();
    report.merge(target_report);
    translate_report_paths(&mut report, &translations);
    correlate_markers(tree, &mut report);
    if generated_invalid {
        return Err(Error::InvalidGeneratedConfig { report });
    }
    if options.strict && !report.is_empty() {
        return Err(Error::InvalidSourceConfig { report });
    }

    let value = document.to_value()?;
    if options.translate.debug_print_translations {
        if let Err(missing) = translations.debug_verify_coverage(&value) {
            for path in missing {
                warn!(%path, "no translation for target path");
            }
        }
    }
    let output = if options.pretty {
        let mut output = serde_json::to_vec_pretty(&value)?;
        output.push(b'\n');
        output
    } else {
        serde_json::to_vec(&value)?
    };
    debug!(bytes = output.len(), entries = report.len(), "translation complete");
    Ok(Transpiled { output, report })
}

fn source_error(mut report: Report, tree: &Node) -> Error {
    correlate_markers(tree, &mut report);
    Error::InvalidSourceConfig { report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::EntryKind;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn run(input: &str, options: &TranslateBytesOptions) -> Result<Transpiled> {
        translate_bytes(input.as_bytes(), options)
    }

    fn output_json(transpiled: &Transpiled) -> Value {
        serde_json::from_slice(&transpiled.output).unwrap()
    }

    #[test]
    fn test_minimal_config() {
        let transpiled = run("variant: fcos\nversion: 1.5.0\n", &TranslateBytesOptions::default()).unwrap();
        assert!(transpiled.report.is_empty());
        assert_eq!(output_json(&transpiled), json!({"ignition": {"version": "3.4.0"}}));
        assert_eq!(transpiled.output, br#"{"ignition":{"version":"3.4.0"}}"#.to_vec());
    }

    #[test]
    fn test_pretty_output() {
        let options = TranslateBytesOptions {
            pretty: true,
            ..Default::default()
        };
        let transpiled = run("variant: flatcar\nversion: 1.0.0\n", &options).unwrap();
        let text = String::from_utf8(transpiled.output).unwrap();
        assert_eq!(text, "{\n  \"ignition\": {\n    \"version\": \"3.3.0\"\n  }\n}\n");
    }

    #[test]
    fn test_missing_variant() {
        let err = run("version: 1.5.0\n", &TranslateBytesOptions::default()).unwrap_err();
        let Error::Dispatch { kind, report } = err else {
            panic!("expected a dispatch error");
        };
        assert_eq!(kind, ConfigError::NoVariant);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_unknown_version_marker() {
        let err = run("variant: fcos\nversion: 9.9.9\n", &TranslateBytesOptions::default()).unwrap_err();
        let report = err.report().unwrap();
        let entry = report.iter().next().unwrap();
        assert_eq!(
            entry.message,
            "No translator exists for variant fcos with version 9.9.9"
        );
        assert_eq!(entry.marker.map(|m| m.start_line), Some(2));
    }

    #[test]
    fn test_unused_key_lax_and_strict() {
        let input = "variant: fcos\nversion: 1.5.0\nbogus: 1\n";
        let transpiled = run(input, &TranslateBytesOptions::default()).unwrap();
        let entry = transpiled.report.iter().next().unwrap();
        assert_eq!(entry.kind, EntryKind::Warning);
        assert_eq!(entry.message, "Unused key bogus");
        assert_eq!(entry.marker.map(|m| m.start_line), Some(3));

        let strict = TranslateBytesOptions {
            strict: true,
            ..Default::default()
        };
        let err = run(input, &strict).unwrap_err();
        assert!(matches!(err, Error::InvalidSourceConfig { .. }));
    }

    #[test]
    fn test_warning_fails_strict() {
        let input = "variant: fcos\nversion: 1.5.0\nstorage:\n  files:\n    - path: /etc/a\n      mode: 644\n";
        let transpiled = run(input, &TranslateBytesOptions::default()).unwrap();
        let entry = transpiled.report.iter().next().unwrap();
        assert_eq!(entry.message, ConfigError::DecimalMode.to_string());
        assert_eq!(entry.path, Path::source("storage.files.0.mode"));
        assert_eq!(entry.marker.map(|m| m.start_line), Some(6));

        let strict = TranslateBytesOptions {
            strict: true,
            ..Default::default()
        };
        assert!(run(input, &strict).is_err());
    }

    #[test]
    fn test_target_error_correlated() {
        let input = "variant: fcos\nversion: 1.5.0\nstorage:\n  files:\n    - path: relative\n";
        let err = run(input, &TranslateBytesOptions::default()).unwrap_err();
        let Error::InvalidGeneratedConfig { report } = err else {
            panic!("expected generated config to be rejected");
        };
        let entry = report.iter().next().unwrap();
        assert_eq!(entry.path, Path::source("storage.files.0.path"));
        assert_eq!(entry.marker.map(|m| m.start_line), Some(5));
    }

    #[test]
    fn test_openshift_raw() {
        let input = "variant: openshift\nversion: 4.14.0\nmetadata:\n  name: 99-worker\n  labels:\n    machineconfiguration.openshift.io/role: worker\n";
        let wrapped = run(input, &TranslateBytesOptions::default()).unwrap();
        let value = output_json(&wrapped);
        assert_eq!(value["kind"], "MachineConfig");
        assert_eq!(value["spec"]["config"]["ignition"]["version"], "3.4.0");

        let raw = TranslateBytesOptions {
            raw: true,
            ..Default::default()
        };
        let bare = run(input, &raw).unwrap();
        assert_eq!(output_json(&bare), json!({"ignition": {"version": "3.4.0"}}));
    }
}
