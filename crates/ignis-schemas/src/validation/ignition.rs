//! Validation rules for Ignition 3.x configs
//!
//! Each structure validates its own fields and recurses into its children.
//! Cross-entry rules (duplicate node paths, duplicate keys) live on the
//! containing structure.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::ignition::*;
use crate::validation::base::{SchemaValidator, ValidationContext, ValidationHelpers};
use crate::validation::error::ValidationErrors;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

const URL_SCHEMES: &[&str] = &["http", "https", "tftp", "s3", "gs", "arn", "data"];
const FILESYSTEM_FORMATS: &[&str] = &["ext4", "btrfs", "xfs", "vfat", "swap", "none"];
const RAID_LEVELS: &[&str] = &[
    "linear", "raid0", "0", "stripe", "raid1", "1", "mirror", "raid4", "4", "raid5", "5",
    "raid6", "6", "raid10", "10",
];

fn hash_regex() -> &'static Regex {
    static HASH: OnceLock<Regex> = OnceLock::new();
    HASH.get_or_init(|| Regex::new(r"^(sha512|sha256)-([0-9a-fA-F]*)$").expect("valid regex"))
}

fn unit_name_regex() -> &'static Regex {
    static UNIT: OnceLock<Regex> = OnceLock::new();
    UNIT.get_or_init(|| {
        Regex::new(
            r"^[^/]+\.(service|socket|device|mount|automount|swap|target|path|timer|snapshot|slice|scope)$",
        )
        .expect("valid regex")
    })
}

impl SchemaValidator for Config {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        self.ignition
            .validate_with_context(&context.child("ignition"), errors);

        let kargs = context.child("kernelArguments");
        ValidationHelpers::validate_since(
            self.kernel_arguments != KernelArguments::default(),
            3,
            3,
            &kargs,
            errors,
        );
        self.kernel_arguments.validate_with_context(&kargs, errors);

        self.passwd.validate_with_context(&context.child("passwd"), errors);
        self.storage.validate_with_context(&context.child("storage"), errors);
        self.systemd.validate_with_context(&context.child("systemd"), errors);
    }
}

impl SchemaValidator for Ignition {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let config = context.child("config");
        self.config
            .merge
            .validate_with_context(&config.child("merge"), errors);
        if self.config.replace != Resource::default() {
            self.config
                .replace
                .validate_with_context(&config.child("replace"), errors);
        }
        self.security
            .tls
            .certificate_authorities
            .validate_with_context(
                &context
                    .child("security")
                    .child("tls")
                    .child("certificateAuthorities"),
                errors,
            );

        let timeouts = context.child("timeouts");
        for (name, value) in [
            ("httpResponseHeaders", self.timeouts.http_response_headers),
            ("httpTotal", self.timeouts.http_total),
        ] {
            if matches!(value, Some(v) if v < 0) {
                errors.add(timeouts.child(name).error("timeout must be non-negative"));
            }
        }
    }
}

impl SchemaValidator for Resource {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        if let Some(source) = &self.source {
            validate_url(source, &context.child("source"), errors);
        }
        if let Some(compression) = &self.compression {
            if !compression.is_empty() && compression != "gzip" {
                errors.add(context.child("compression").error("invalid compression method"));
            }
        }
        if let Some(hash) = &self.verification.hash {
            validate_hash(hash, &context.child("verification").child("hash"), errors);
        }
        for (i, header) in self.http_headers.iter().enumerate() {
            let header_context = context.child("httpHeaders").child_index(i);
            ValidationHelpers::validate_required(
                &header.name,
                "header name is required",
                &header_context.child("name"),
                errors,
            );
        }
        let mut names = HashSet::new();
        for (i, header) in self.http_headers.iter().enumerate() {
            if !header.name.is_empty() && !names.insert(header.name.as_str()) {
                errors.add(
                    context
                        .child("httpHeaders")
                        .child_index(i)
                        .child("name")
                        .error("duplicate entry defined"),
                );
            }
        }
        if !self.http_headers.is_empty() && self.source.is_none() {
            errors.add(
                context
                    .child("httpHeaders")
                    .error("cannot use httpHeaders without a source"),
            );
        }
    }
}

fn validate_url(source: &str, context: &ValidationContext, errors: &mut ValidationErrors) {
    match Url::parse(source) {
        Ok(url) => {
            if !URL_SCHEMES.contains(&url.scheme()) {
                errors.add(context.error("invalid url scheme"));
            }
        }
        Err(_) => errors.add(context.error("unable to parse url")),
    }
}

fn validate_hash(hash: &str, context: &ValidationContext, errors: &mut ValidationErrors) {
    let Some(captures) = hash_regex().captures(hash) else {
        errors.add(context.error("unrecognized hash function"));
        return;
    };
    let expected = match &captures[1] {
        "sha512" => 128,
        _ => 64,
    };
    if captures[2].len() != expected {
        errors.add(context.error("incorrect size for hash sum"));
    }
}

impl SchemaValidator for KernelArguments {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let should_exist: HashSet<&str> = self.should_exist.iter().map(String::as_str).collect();
        for (i, arg) in self.should_not_exist.iter().enumerate() {
            if should_exist.contains(arg.as_str()) {
                errors.add(
                    context
                        .child("shouldNotExist")
                        .child_index(i)
                        .error("argument is both required and forbidden"),
                );
            }
        }
    }
}

impl SchemaValidator for Passwd {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let users = context.child("users");
        let mut seen = HashSet::new();
        for (i, user) in self.users.iter().enumerate() {
            let user_context = users.child_index(i);
            ValidationHelpers::validate_required(
                &user.name,
                "name is required",
                &user_context.child("name"),
                errors,
            );
            if !user.name.is_empty() && !seen.insert(user.name.as_str()) {
                errors.add(user_context.child("name").error("duplicate entry defined"));
            }
        }
        let groups = context.child("groups");
        let mut seen = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            let group_context = groups.child_index(i);
            ValidationHelpers::validate_required(
                &group.name,
                "name is required",
                &group_context.child("name"),
                errors,
            );
            if !group.name.is_empty() && !seen.insert(group.name.as_str()) {
                errors.add(group_context.child("name").error("duplicate entry defined"));
            }
        }
    }
}

impl SchemaValidator for Storage {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        self.disks.validate_with_context(&context.child("disks"), errors);
        self.raid.validate_with_context(&context.child("raid"), errors);
        self.filesystems
            .validate_with_context(&context.child("filesystems"), errors);
        self.luks.validate_with_context(&context.child("luks"), errors);
        self.files.validate_with_context(&context.child("files"), errors);
        self.directories
            .validate_with_context(&context.child("directories"), errors);
        self.links.validate_with_context(&context.child("links"), errors);

        // A node path may be claimed by exactly one file, directory or link.
        let mut seen = HashSet::new();
        let nodes = self
            .files
            .iter()
            .map(|f| ("files", f.path.as_str()))
            .chain(self.directories.iter().map(|d| ("directories", d.path.as_str())))
            .chain(self.links.iter().map(|l| ("links", l.path.as_str())));
        let mut counters = std::collections::HashMap::new();
        for (kind, path) in nodes {
            let index = counters.entry(kind).or_insert(0usize);
            if !path.is_empty() && !seen.insert(path) {
                errors.add(
                    context
                        .child(kind)
                        .child_index(*index)
                        .child("path")
                        .error("duplicate entry defined"),
                );
            }
            *index += 1;
        }

        let mut devices = HashSet::new();
        for (i, disk) in self.disks.iter().enumerate() {
            if !disk.device.is_empty() && !devices.insert(disk.device.as_str()) {
                errors.add(
                    context
                        .child("disks")
                        .child_index(i)
                        .child("device")
                        .error("duplicate entry defined"),
                );
            }
        }
    }
}

impl SchemaValidator for Disk {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let device = context.child("device");
        if self.device.is_empty() {
            errors.add(device.error("disk device is required"));
        } else {
            ValidationHelpers::validate_absolute_path(&self.device, &device, errors);
        }
        self.partitions
            .validate_with_context(&context.child("partitions"), errors);

        let mut labels = HashSet::new();
        let mut numbers = HashSet::new();
        for (i, partition) in self.partitions.iter().enumerate() {
            let partition_context = context.child("partitions").child_index(i);
            if let Some(label) = &partition.label {
                if !labels.insert(label.as_str()) {
                    errors.add(partition_context.child("label").error("duplicate entry defined"));
                }
            }
            if partition.number != 0 && !numbers.insert(partition.number) {
                errors.add(partition_context.child("number").error("duplicate entry defined"));
            }
        }
    }
}

impl SchemaValidator for Partition {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        if let Some(label) = &self.label {
            if label.chars().count() > 36 {
                errors.add(
                    context
                        .child("label")
                        .error("partition labels may not exceed 36 characters"),
                );
            }
            if label.contains(':') {
                errors.add(
                    context
                        .child("label")
                        .error("partition labels may not contain colons"),
                );
            }
        }
        if self.number < 0 {
            errors.add(context.child("number").error("partition number must not be negative"));
        }
        for (name, value) in [("sizeMiB", self.size_mib), ("startMiB", self.start_mib)] {
            if matches!(value, Some(v) if v < 0) {
                errors.add(context.child(name).error("partition dimensions must not be negative"));
            }
        }
    }
}

impl SchemaValidator for Raid {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        ValidationHelpers::validate_required(
            &self.name,
            "raid name is required",
            &context.child("name"),
            errors,
        );
        match &self.level {
            Some(level) if !RAID_LEVELS.contains(&level.as_str()) => {
                errors.add(context.child("level").error("unrecognized raid level"));
            }
            Some(_) => {}
            None => errors.add(context.child("level").error("raid level is required")),
        }
        if self.devices.is_empty() {
            errors.add(context.child("devices").error("raid devices are required"));
        }
    }
}

impl SchemaValidator for Filesystem {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let device = context.child("device");
        if self.device.is_empty() {
            errors.add(device.error("filesystem device is required"));
        } else {
            ValidationHelpers::validate_absolute_path(&self.device, &device, errors);
        }
        if let Some(format) = &self.format {
            if !format.is_empty() && !FILESYSTEM_FORMATS.contains(&format.as_str()) {
                errors.add(context.child("format").error("invalid filesystem format"));
            }
        }
        if let Some(path) = &self.path {
            ValidationHelpers::validate_absolute_path(path, &context.child("path"), errors);
            if self.format.as_deref().unwrap_or_default().is_empty() {
                errors.add(
                    context
                        .child("format")
                        .error("filesystem format is required when a path is set"),
                );
            }
        }
    }
}

impl SchemaValidator for Luks {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        ValidationHelpers::validate_required(
            &self.name,
            "luks name is required",
            &context.child("name"),
            errors,
        );
        match &self.device {
            Some(device) => {
                ValidationHelpers::validate_absolute_path(device, &context.child("device"), errors)
            }
            None => errors.add(context.child("device").error("luks device is required")),
        }
        if self.key_file != Resource::default() {
            self.key_file
                .validate_with_context(&context.child("keyFile"), errors);
        }
        ValidationHelpers::validate_since(
            self.discard.is_some(),
            3,
            4,
            &context.child("discard"),
            errors,
        );
        ValidationHelpers::validate_since(
            !self.open_options.is_empty(),
            3,
            4,
            &context.child("openOptions"),
            errors,
        );

        let clevis = context.child("clevis");
        for (i, tang) in self.clevis.tang.iter().enumerate() {
            let tang_context = clevis.child("tang").child_index(i);
            if tang.url.is_empty() {
                errors.add(tang_context.child("url").error("tang url is required"));
            } else {
                validate_url(&tang.url, &tang_context.child("url"), errors);
            }
            ValidationHelpers::validate_since(
                tang.advertisement.is_some(),
                3,
                4,
                &tang_context.child("advertisement"),
                errors,
            );
        }
        if matches!(self.clevis.threshold, Some(t) if t < 1) {
            errors.add(
                clevis
                    .child("threshold")
                    .error("clevis threshold must be at least 1"),
            );
        }
        let custom = &self.clevis.custom;
        if custom != &ClevisCustom::default() {
            if custom.pin.as_deref().unwrap_or_default().is_empty() {
                errors.add(clevis.child("custom").child("pin").error("clevis pin is required"));
            }
            if !self.clevis.tang.is_empty() || self.clevis.tpm2 == Some(true) {
                errors.add(
                    clevis
                        .child("custom")
                        .error("cannot use custom clevis config with tpm2 or tang"),
                );
            }
        }
    }
}

fn validate_node(
    path: &str,
    user: &NodeUser,
    group: &NodeGroup,
    context: &ValidationContext,
    errors: &mut ValidationErrors,
) {
    let path_context = context.child("path");
    if path.is_empty() {
        errors.add(path_context.error("path is required"));
    } else {
        ValidationHelpers::validate_absolute_path(path, &path_context, errors);
    }
    if user.id.is_some() && user.name.is_some() {
        errors.add(context.child("user").error("cannot set both id and name"));
    }
    if group.id.is_some() && group.name.is_some() {
        errors.add(context.child("group").error("cannot set both id and name"));
    }
}

fn validate_mode(mode: Option<i64>, context: &ValidationContext, errors: &mut ValidationErrors) {
    if matches!(mode, Some(m) if !(0..=0o7777).contains(&m)) {
        errors.add(context.child("mode").error("illegal file mode"));
    }
}

impl SchemaValidator for File {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        validate_node(&self.path, &self.user, &self.group, context, errors);
        validate_mode(self.mode, context, errors);
        if self.contents != Resource::default() {
            self.contents
                .validate_with_context(&context.child("contents"), errors);
        }
        self.append.validate_with_context(&context.child("append"), errors);
    }
}

impl SchemaValidator for Directory {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        validate_node(&self.path, &self.user, &self.group, context, errors);
        validate_mode(self.mode, context, errors);
    }
}

impl SchemaValidator for Link {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        validate_node(&self.path, &self.user, &self.group, context, errors);
        if self.target.as_deref().unwrap_or_default().is_empty() {
            errors.add(context.child("target").error("link target is required"));
        }
    }
}

impl SchemaValidator for Systemd {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let units = context.child("units");
        self.units.validate_with_context(&units, errors);
        let mut seen = HashSet::new();
        for (i, unit) in self.units.iter().enumerate() {
            if !unit.name.is_empty() && !seen.insert(unit.name.as_str()) {
                errors.add(units.child_index(i).child("name").error("duplicate entry defined"));
            }
        }
    }
}

impl SchemaValidator for Unit {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        let name = context.child("name");
        if self.name.is_empty() {
            errors.add(name.error("unit name is required"));
        } else if !unit_name_regex().is_match(&self.name) {
            errors.add(name.error("invalid systemd unit extension"));
        }
        if self.mask == Some(true) && self.contents.is_some() {
            errors.add(
                context
                    .child("contents")
                    .warning("unit is masked; contents will be ignored"),
            );
        }
        let dropins = context.child("dropins");
        let mut seen = HashSet::new();
        for (i, dropin) in self.dropins.iter().enumerate() {
            let dropin_name = dropins.child_index(i).child("name");
            if dropin.name.is_empty() {
                errors.add(dropin_name.error("drop-in name is required"));
            } else if !dropin.name.ends_with(".conf") {
                errors.add(dropin_name.error("invalid systemd drop-in extension"));
            } else if !seen.insert(dropin.name.as_str()) {
                errors.add(dropin_name.error("duplicate entry defined"));
            }
        }
    }
}
