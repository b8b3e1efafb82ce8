//! OpenShift variant
//!
//! Emits a MachineConfig for the Machine Config Operator, or with `raw` the
//! bare Ignition config inside it. The operator applies only part of
//! Ignition, so the rest is rejected up front.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::{schema, validate_config};
use crate::error::ConfigError;
use crate::options::TranslateOptions;
use crate::path::{Path, Schema};
use crate::report::Report;
use crate::translation::{merge_translated, translate_report_paths, Translated, TranslationSet};
use crate::variants::boot_device::{plan_boot_device, BootDevice};
use crate::variants::fcos::check_root_partition_numbers;
use crate::variants::filter::{apply_filters, FieldFilter};
use crate::variants::fips::apply_fips_ciphers;
use crate::variants::{into_ignition, translate_base, Document, SourceConfig, VariantSpec};
use ignis_schemas::machine_config::ROLE_LABEL;
use ignis_schemas::MachineConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const KERNEL_TYPES: &[&str] = &["", "default", "realtime"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: String,
    pub version: String,
    pub metadata: Metadata,
    #[serde(flatten)]
    pub base: schema::Config,
    pub boot_device: BootDevice,
    pub openshift: Openshift,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Openshift {
    pub kernel_arguments: Vec<String>,
    pub extensions: Vec<String>,
    pub fips: Option<bool>,
    pub kernel_type: Option<String>,
}

/// Ignition user fields the operator ignores, with their source names
const USER_FIELDS: &[(&str, &str)] = &[
    ("gecos", "gecos"),
    ("groups", "groups"),
    ("homeDir", "home_dir"),
    ("noCreateHome", "no_create_home"),
    ("noLogInit", "no_log_init"),
    ("noUserGroup", "no_user_group"),
    ("primaryGroup", "primary_group"),
    ("shell", "shell"),
    ("shouldExist", "should_exist"),
    ("system", "system"),
    ("uid", "uid"),
];

/// Ignition fields the Machine Config Operator cannot apply
fn mco_filters(spec: &VariantSpec) -> Vec<FieldFilter> {
    let mut filters = vec![
        FieldFilter::forbid_if(
            "storage.filesystems.*.format",
            |v| v == "btrfs",
            ConfigError::BtrfsSupport,
        ),
        FieldFilter::forbid_if(
            "storage.filesystems.*.format",
            |v| v == "none",
            ConfigError::FilesystemNoneSupport,
        ),
        FieldFilter::forbid("storage.directories.*", ConfigError::DirectorySupport),
        FieldFilter::forbid("storage.files.*.append", ConfigError::FileAppendSupport),
        FieldFilter::forbid(
            "storage.files.*.contents.httpHeaders",
            ConfigError::FileHeaderSupport,
        ),
        FieldFilter::forbid_if(
            "storage.files.*.contents.source",
            |v| v.as_str().is_some_and(|url| !url.starts_with("data:")),
            ConfigError::FileSchemeSupport,
        ),
        FieldFilter::forbid("passwd.groups.*", ConfigError::GroupSupport),
        FieldFilter::forbid("storage.links.*", ConfigError::LinkSupport),
        FieldFilter::forbid_if(
            "passwd.users.*.name",
            |v| v != "core",
            ConfigError::UserNameSupport,
        ),
        FieldFilter::forbid(
            "kernelArguments.shouldExist",
            ConfigError::KernelArgumentSupport,
        ),
        FieldFilter::forbid(
            "kernelArguments.shouldNotExist",
            ConfigError::KernelArgumentSupport,
        ),
    ];
    if !spec.at_least(4, 13, 0) {
        filters.push(FieldFilter::forbid(
            "storage.files.*.contents.compression",
            ConfigError::FileCompressionSupport,
        ));
        filters.push(FieldFilter::forbid(
            "passwd.users.*.passwordHash",
            ConfigError::UserFieldSupport("password_hash".into()),
        ));
    }
    for (target, source) in USER_FIELDS {
        filters.push(FieldFilter::forbid(
            &format!("passwd.users.*.{}", target),
            ConfigError::UserFieldSupport((*source).into()),
        ));
    }
    filters
}

/// MachineConfig fields that a bare Ignition config cannot carry
fn raw_filters() -> Vec<FieldFilter> {
    ["spec.kernelArguments", "spec.extensions", "spec.fips", "spec.kernelType"]
        .into_iter()
        .map(|pattern| FieldFilter::warn(pattern, ConfigError::FieldElided))
        .collect()
}

impl SourceConfig for Config {
    fn validate(&self, _spec: &VariantSpec) -> Report {
        let root = Path::root(Schema::Source);
        let mut report = validate_config(&self.base, &root);
        if self.metadata.name.is_empty() {
            report.add_error(Path::source("metadata.name"), ConfigError::NameRequired);
        }
        if !self.metadata.labels.contains_key(ROLE_LABEL) {
            report.add_error(Path::source("metadata.labels"), ConfigError::RoleRequired);
        }
        if let Some(kernel_type) = &self.openshift.kernel_type {
            if !KERNEL_TYPES.contains(&kernel_type.as_str()) {
                report.add_error(
                    Path::source("openshift.kernel_type"),
                    ConfigError::InvalidKernelType,
                );
            }
        }
        report.merge(self.boot_device.validate(&root));
        report.merge(check_root_partition_numbers(&self.base));
        report
    }

    fn translate(
        &self,
        spec: &VariantSpec,
        options: &TranslateOptions,
        raw: bool,
    ) -> Translated<Option<Document>> {
        let mut options = options.clone();
        if !spec.at_least(4, 13, 0) {
            // the 4.12 operator cannot decompress file contents
            options.no_resource_auto_compression = true;
        }

        let root = Path::root(Schema::Target);
        let user = translate_base(&self.base, &options);
        let parent = plan_boot_device(&self.boot_device, &Path::root(Schema::Source));
        let mut merged = merge_translated(parent, user);
        if self.openshift.fips == Some(true) {
            apply_fips_ciphers(
                &mut merged.value,
                &mut merged.translations,
                &Path::source("openshift.fips"),
                &root,
            );
        }
        apply_filters(&mco_filters(spec), &merged.value, &root, &mut merged.report);

        let Translated {
            value,
            translations,
            mut report,
        } = into_ignition(merged, spec);
        let config_path = Path::target("spec.config");
        report.prefix_paths(&config_path);
        let mut ts = translations.prefix_paths(&Path::root(Schema::Source), &config_path);

        let Some(config) = value else {
            return Translated {
                value: None,
                translations: ts,
                report,
            };
        };
        let mc = self.machine_config(config, &mut ts);

        if !raw {
            return Translated {
                value: Some(Document::MachineConfig(mc)),
                translations: ts,
                report,
            };
        }

        match serde_json::to_value(&mc) {
            Ok(wrapper) => apply_filters(&raw_filters(), &wrapper, &root, &mut report),
            Err(err) => report.add_error(Path::source("openshift"), ConfigError::Unmarshal(err.to_string())),
        }
        translate_report_paths(&mut report, &ts);
        debug!(name = %self.metadata.name, "emitting bare ignition config");
        Translated {
            value: Some(Document::Ignition(mc.spec.config)),
            translations: ts.descend(&config_path),
            report,
        }
    }
}

impl Config {
    fn machine_config(&self, config: ignis_schemas::ignition::Config, ts: &mut TranslationSet) -> MachineConfig {
        let mut mc = MachineConfig::wrapping(config);
        let version = Path::source("version");
        for field in ["apiVersion", "kind", "spec", "spec.config"] {
            ts.add(version.clone(), Path::target(field));
        }

        mc.metadata.name = self.metadata.name.clone();
        mc.metadata.labels = self.metadata.labels.clone();
        if !mc.metadata.name.is_empty() || !mc.metadata.labels.is_empty() {
            ts.add(Path::source("metadata"), Path::target("metadata"));
        }
        if !mc.metadata.name.is_empty() {
            ts.add(Path::source("metadata.name"), Path::target("metadata.name"));
        }
        if !mc.metadata.labels.is_empty() {
            ts.add(Path::source("metadata.labels"), Path::target("metadata.labels"));
        }
        for key in self.metadata.labels.keys() {
            ts.add(
                Path::source("metadata.labels").append(key.as_str()),
                Path::target("metadata.labels").append(key.as_str()),
            );
        }

        let openshift = &self.openshift;
        mc.spec.kernel_arguments = openshift.kernel_arguments.clone();
        trace_list(
            ts,
            &Path::source("openshift.kernel_arguments"),
            &Path::target("spec.kernelArguments"),
            openshift.kernel_arguments.len(),
        );
        mc.spec.extensions = openshift.extensions.clone();
        trace_list(
            ts,
            &Path::source("openshift.extensions"),
            &Path::target("spec.extensions"),
            openshift.extensions.len(),
        );
        if openshift.fips.is_some() {
            mc.spec.fips = openshift.fips;
            ts.add(Path::source("openshift.fips"), Path::target("spec.fips"));
        }
        if let Some(kernel_type) = openshift.kernel_type.as_deref().filter(|k| !k.is_empty()) {
            mc.spec.kernel_type = Some(kernel_type.to_string());
            ts.add(Path::source("openshift.kernel_type"), Path::target("spec.kernelType"));
        }
        mc
    }
}

fn trace_list(ts: &mut TranslationSet, from: &Path, to: &Path, len: usize) {
    if len == 0 {
        return;
    }
    ts.add(from.clone(), to.clone());
    for i in 0..len {
        ts.add(from.append(i), to.append(i));
    }
}
