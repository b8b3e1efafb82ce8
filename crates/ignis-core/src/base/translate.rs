//! Translation of the shared source schema into an Ignition document
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::mount_units::mount_units;
use crate::base::schema::Config;
use crate::error::ConfigError;
use crate::options::TranslateOptions;
use crate::path::{Path, Schema};
use crate::resource::{render, translate_resource, translate_trees};
use crate::translation::{merge_translated, GenericTranslator, Translated};
use crate::util::read_local;
use serde_json::{json, Value};
use tracing::debug;

/// Resources embedded as data URLs
const RESOURCE_FIELDS: &[&str] = &[
    "ignition.config.merge.*",
    "ignition.config.replace",
    "ignition.security.tls.certificate_authorities.*",
    "storage.files.*.contents",
    "storage.files.*.append.*",
    "storage.luks.*.key_file",
];

/// Fields that only exist in the source
const SOURCE_ONLY_FIELDS: &[&str] = &[
    "storage.trees",
    "storage.filesystems.*.with_mount_unit",
    "systemd.units.*.contents_local",
    "systemd.units.*.dropins.*.contents_local",
    "passwd.users.*.ssh_authorized_keys_local",
];

/// Translate a base config into an Ignition document without a version
///
/// Local files, trees and generated mount units are resolved here. The
/// caller sets `ignition.version` and wraps the result.
pub fn translate_config(config: &Config, options: &TranslateOptions) -> Translated<Value> {
    let source = match serde_json::to_value(config) {
        Ok(source) => source,
        Err(err) => {
            let mut failed = Translated::new(json!({}));
            failed
                .report
                .add_error(Path::root(Schema::Source), ConfigError::Unmarshal(err.to_string()));
            return failed;
        }
    };

    let translator = base_translator(options);
    let translated = translator.translate(&source);
    let mut result = translated.map(|value| value.unwrap_or_else(|| json!({})));

    translate_trees(
        &config.storage.trees,
        &Path::root(Schema::Source),
        &mut result.value,
        &mut result.translations,
        &mut result.report,
        options,
    );

    let units = mount_units(&config.storage.filesystems, &Path::root(Schema::Source));
    if units.value.get("systemd").is_some() {
        debug!(count = config.storage.filesystems.len(), "adding generated mount units");
        result = merge_translated(units, result);
    }
    result
}

/// The generic translator with every base rename, skip and override
pub fn base_translator(options: &TranslateOptions) -> GenericTranslator<'_> {
    let mut translator = GenericTranslator::new()
        .rename("size_mib", "sizeMiB")
        .rename("start_mib", "startMiB");
    for field in SOURCE_ONLY_FIELDS {
        translator = translator.skip(field);
    }
    for field in RESOURCE_FIELDS {
        translator = translator.with_override(field, move |_, value, from, to| {
            translate_resource(value, from, to, options)
        });
    }
    translator
        .with_override("systemd.units.*", move |tr, value, from, to| {
            translate_unit_contents(tr, value, from, to, options)
        })
        .with_override("systemd.units.*.dropins.*", move |tr, value, from, to| {
            translate_unit_contents(tr, value, from, to, options)
        })
        .with_override("passwd.users.*", move |tr, value, from, to| {
            translate_user(tr, value, from, to, options)
        })
}

/// Unit or dropin whose contents may come from `contents_local`
fn translate_unit_contents(
    translator: &GenericTranslator<'_>,
    value: &Value,
    from: &Path,
    to: &Path,
    options: &TranslateOptions,
) -> Translated<Option<Value>> {
    let mut result = translator.walk_default(value, from, to);
    let Some(local) = value.get("contents_local").and_then(Value::as_str) else {
        return result;
    };
    let local_from = from.append("contents_local");
    let body = read_local(options.files_dir.as_deref(), local)
        .and_then(|data| render(options, local, data));
    match body {
        Ok(data) => {
            let contents = String::from_utf8_lossy(&data).into_owned();
            let target = result.value.get_or_insert_with(|| json!({}));
            if let Value::Object(map) = target {
                map.insert("contents".into(), json!(contents));
                result.translations.add(local_from, to.append("contents"));
                result.translations.add(from.clone(), to.clone());
            }
        }
        Err(err) => result.report.add_error(local_from, err),
    }
    result
}

/// User whose authorized keys may also come from local files, one key per
/// non-empty line
fn translate_user(
    translator: &GenericTranslator<'_>,
    value: &Value,
    from: &Path,
    to: &Path,
    options: &TranslateOptions,
) -> Translated<Option<Value>> {
    let mut result = translator.walk_default(value, from, to);
    let Some(locals) = value
        .get("ssh_authorized_keys_local")
        .and_then(Value::as_array)
        .filter(|locals| !locals.is_empty())
    else {
        return result;
    };

    let keys_to = to.append("sshAuthorizedKeys");
    let mut keys: Vec<Value> = result
        .value
        .as_ref()
        .and_then(|user| user.get("sshAuthorizedKeys"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let had_keys = !keys.is_empty();

    for (i, local) in locals.iter().enumerate() {
        let Some(local) = local.as_str() else {
            continue;
        };
        let local_from = from.append("ssh_authorized_keys_local").append(i);
        let data = match read_local(options.files_dir.as_deref(), local) {
            Ok(data) => data,
            Err(err) => {
                result.report.add_error(local_from, err);
                continue;
            }
        };
        for line in String::from_utf8_lossy(&data).lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            result
                .translations
                .add(local_from.clone(), keys_to.append(keys.len()));
            keys.push(json!(line));
        }
        if !had_keys {
            result.translations.add(local_from, keys_to.clone());
        }
    }

    if !keys.is_empty() {
        let target = result.value.get_or_insert_with(|| json!({}));
        if let Value::Object(map) = target {
            map.insert("sshAuthorizedKeys".into(), Value::Array(keys));
            result.translations.add(from.clone(), to.clone());
        }
    }
    result
}
