//! Fedora CoreOS variant
//!
//! Adds `boot_device` planning and `extensions` on top of the shared schema.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::{schema, validate_config};
use crate::error::ConfigError;
use crate::options::TranslateOptions;
use crate::path::{Path, Schema};
use crate::report::Report;
use crate::resource::data_url;
use crate::translation::{merge_translated, Translated};
use crate::variants::boot_device::{plan_boot_device, BootDevice};
use crate::variants::{into_ignition, translate_base, Document, SourceConfig, VariantSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Disk that the root partition layout is pinned to
pub const BOOT_DISK: &str = "/dev/disk/by-id/coreos-boot-disk";

/// File listing the requested OS extensions
pub const EXTENSIONS_PATH: &str = "/etc/rpm-ostree/origin.d/extensions-ignis.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: String,
    pub version: String,
    #[serde(flatten)]
    pub base: schema::Config,
    pub boot_device: BootDevice,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extension {
    pub name: String,
}

impl SourceConfig for Config {
    fn validate(&self, _spec: &VariantSpec) -> Report {
        let root = Path::root(Schema::Source);
        let mut report = validate_config(&self.base, &root);
        report.merge(self.boot_device.validate(&root));
        for (i, extension) in self.extensions.iter().enumerate() {
            if extension.name.is_empty() {
                report.add_error(
                    Path::source("extensions").append(i).append("name"),
                    ConfigError::ExtensionNameRequired,
                );
            }
        }
        report.merge(check_root_partition_numbers(&self.base));
        report
    }

    fn translate(
        &self,
        spec: &VariantSpec,
        options: &TranslateOptions,
        _raw: bool,
    ) -> Translated<Option<Document>> {
        let root = Path::root(Schema::Source);
        let user = translate_base(&self.base, options);
        let mut parent = plan_boot_device(&self.boot_device, &root);
        let names: Vec<&str> = self.extensions.iter().map(|e| e.name.as_str()).collect();
        if !names.is_empty() {
            parent = merge_translated(parent, extensions_file(&names, options));
        }
        let merged = merge_translated(parent, user);
        into_ignition(merged, spec).map(|config| config.map(Document::Ignition))
    }
}

/// Warn about a `root` partition on the boot disk with a number other than 4
///
/// Such a partition does not replace the stock root filesystem; a new one is
/// created next to it.
pub(crate) fn check_root_partition_numbers(config: &schema::Config) -> Report {
    let mut report = Report::new();
    for (i, disk) in config.storage.disks.iter().enumerate() {
        if disk.device != BOOT_DISK {
            continue;
        }
        for (j, partition) in disk.partitions.iter().enumerate() {
            let wrong = matches!(partition.number, Some(n) if n != 0 && n != 4);
            if partition.label.as_deref() == Some("root") && wrong {
                report.add_warning(
                    Path::source("storage.disks")
                        .append(i)
                        .append("partitions")
                        .append(j)
                        .append("number"),
                    ConfigError::WrongPartitionNumber,
                );
            }
        }
    }
    report
}

/// Body of the extensions file
#[derive(Debug, Serialize)]
struct ExtensionsFile<'a> {
    packages: Vec<&'a str>,
}

/// A `storage.files` fragment listing the extensions as packages
pub(crate) fn extensions_file(names: &[&str], options: &TranslateOptions) -> Translated<Value> {
    let document = ExtensionsFile {
        packages: names.to_vec(),
    };
    let body = match serde_yaml::to_string(&document) {
        Ok(yaml) => format!("# Generated by Ignis\n\n{}", yaml),
        Err(err) => return failed_extensions(ConfigError::Unmarshal(err.to_string())),
    };
    let mut contents = serde_json::Map::new();
    match data_url::encode(body.as_bytes(), !options.no_resource_auto_compression) {
        Ok(encoded) => {
            contents.insert("source".into(), json!(encoded.url));
            if encoded.gzipped {
                contents.insert("compression".into(), json!("gzip"));
            }
        }
        Err(err) => return failed_extensions(ConfigError::Io(err.to_string())),
    }
    debug!(count = names.len(), "writing extensions file");

    let file = json!({
        "path": EXTENSIONS_PATH,
        "mode": 0o644,
        "contents": Value::Object(contents),
    });
    let storage = json!({"files": [file]});
    let mut result = Translated::new(Value::Null);
    result
        .translations
        .add_from_common_source(&Path::source("extensions"), &Path::target("storage"), &storage);
    result.value = json!({ "storage": storage });
    result
}

fn failed_extensions(error: ConfigError) -> Translated<Value> {
    let mut failed = Translated::new(json!({}));
    failed.report.add_error(Path::source("extensions"), error);
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::schema::{Disk, Partition};
    use crate::variants::lookup;
    use pretty_assertions::assert_eq;
    use semver::Version;

    fn spec() -> &'static VariantSpec {
        lookup("fcos", &Version::new(1, 5, 0)).unwrap()
    }

    #[test]
    fn test_extension_and_partition_checks() {
        let mut config = Config {
            extensions: vec![Extension { name: "usbguard".into() }, Extension::default()],
            ..Default::default()
        };
        config.base.storage.disks.push(Disk {
            device: BOOT_DISK.into(),
            partitions: vec![
                Partition {
                    label: Some("root".into()),
                    number: Some(5),
                    ..Default::default()
                },
                Partition {
                    label: Some("root".into()),
                    number: Some(4),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        let report = config.validate(spec());
        let found: Vec<(String, bool)> = report
            .iter()
            .map(|e| (e.path.to_string(), e.kind == crate::report::EntryKind::Error))
            .collect();
        assert_eq!(
            found,
            vec![
                ("$.extensions.1.name".to_string(), true),
                ("$.storage.disks.0.partitions.0.number".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_extensions_file() {
        let config = Config {
            extensions: vec![Extension { name: "usbguard".into() }],
            ..Default::default()
        };
        let result = config.translate(spec(), &TranslateOptions::default(), false);
        assert!(result.report.is_empty(), "{}", result.report);
        let Some(Document::Ignition(ignition)) = result.value else {
            panic!("expected an ignition config");
        };
        assert_eq!(ignition.ignition.version, "3.4.0");
        let file = &ignition.storage.files[0];
        assert_eq!(file.path, EXTENSIONS_PATH);
        assert_eq!(file.mode, Some(0o644));
        assert_eq!(
            file.contents.source.as_deref(),
            Some("data:,%23%20Generated%20by%20Ignis%0A%0Apackages:%0A-%20usbguard%0A")
        );
        assert_eq!(
            result
                .translations
                .lookup(&Path::target("storage.files.0.contents.source"))
                .unwrap()
                .from,
            Path::source("extensions")
        );
    }

    #[test]
    fn test_extension_names_stay_strings() {
        let config = Config {
            extensions: vec![
                Extension { name: "a: b".into() },
                Extension { name: "#x".into() },
                Extension { name: "yes".into() },
            ],
            ..Default::default()
        };
        let options = TranslateOptions {
            no_resource_auto_compression: true,
            ..Default::default()
        };
        let result = config.translate(spec(), &options, false);
        assert!(result.report.is_empty(), "{}", result.report);
        let Some(Document::Ignition(ignition)) = result.value else {
            panic!("expected an ignition config");
        };
        let source = ignition.storage.files[0].contents.source.clone().unwrap();
        let encoded = source.strip_prefix("data:,").unwrap();
        let body = percent_encoding::percent_decode_str(encoded)
            .decode_utf8()
            .unwrap()
            .into_owned();
        assert!(body.starts_with("# Generated by Ignis\n\n"));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&body).unwrap();
        assert_eq!(
            parsed["packages"],
            serde_yaml::Value::Sequence(vec![
                serde_yaml::Value::String("a: b".into()),
                serde_yaml::Value::String("#x".into()),
                serde_yaml::Value::String("yes".into()),
            ])
        );
    }
}
