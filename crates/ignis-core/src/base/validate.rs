//! Structural validation of the shared source schema
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::schema::{Config, Resource, Unit};
use crate::error::ConfigError;
use crate::path::Path;
use crate::report::Report;
use crate::util::check_for_decimal_mode;

/// Validate a base config whose fields sit at `prefix` in the source
pub fn validate_config(config: &Config, prefix: &Path) -> Report {
    let mut report = Report::new();

    let ignition = prefix.append("ignition");
    for (i, merge) in config.ignition.config.merge.iter().enumerate() {
        validate_resource(merge, &ignition.append("config").append("merge").append(i), &mut report);
    }
    validate_resource(
        &config.ignition.config.replace,
        &ignition.append("config").append("replace"),
        &mut report,
    );
    for (i, ca) in config.ignition.security.tls.certificate_authorities.iter().enumerate() {
        let path = ignition
            .append("security")
            .append("tls")
            .append("certificate_authorities")
            .append(i);
        validate_resource(ca, &path, &mut report);
    }

    let storage = prefix.append("storage");
    for (i, file) in config.storage.files.iter().enumerate() {
        let path = storage.append("files").append(i);
        validate_resource(&file.contents, &path.append("contents"), &mut report);
        for (j, append) in file.append.iter().enumerate() {
            validate_resource(append, &path.append("append").append(j), &mut report);
        }
        if let Some(mode) = file.mode {
            report.add_on_warn(path.append("mode"), check_for_decimal_mode(mode, false));
        }
    }
    for (i, dir) in config.storage.directories.iter().enumerate() {
        if let Some(mode) = dir.mode {
            report.add_on_warn(
                storage.append("directories").append(i).append("mode"),
                check_for_decimal_mode(mode, true),
            );
        }
    }
    for (i, luks) in config.storage.luks.iter().enumerate() {
        validate_resource(
            &luks.key_file,
            &storage.append("luks").append(i).append("key_file"),
            &mut report,
        );
    }
    for (i, tree) in config.storage.trees.iter().enumerate() {
        if tree.local.is_empty() {
            report.add_error(storage.append("trees").append(i).append("local"), ConfigError::TreeNoLocal);
        }
    }
    for (i, fs) in config.storage.filesystems.iter().enumerate() {
        if fs.with_mount_unit != Some(true) {
            continue;
        }
        let path = storage.append("filesystems").append(i);
        if fs.path.as_deref().unwrap_or_default().is_empty() && fs.format.as_deref() != Some("swap") {
            report.add_error(path.append("path"), ConfigError::MountUnitNoPath);
        }
        if fs.format.as_deref().unwrap_or_default().is_empty() {
            report.add_error(path.append("format"), ConfigError::MountUnitNoFormat);
        }
    }

    for (i, unit) in config.systemd.units.iter().enumerate() {
        validate_unit(unit, &prefix.append("systemd").append("units").append(i), &mut report);
    }
    report
}

/// At most one of `source`, `inline` and `local`; the error lands on the
/// second field in that order
fn validate_resource(resource: &Resource, path: &Path, report: &mut Report) {
    if let Some(second) = resource.set_sources().get(1) {
        report.add_error(path.append(*second), ConfigError::TooManyResourceSources);
    }
}

fn validate_unit(unit: &Unit, path: &Path, report: &mut Report) {
    if unit.contents.is_some() && unit.contents_local.is_some() {
        report.add_error(path.append("contents_local"), ConfigError::TooManySystemdSources);
    }
    for (i, dropin) in unit.dropins.iter().enumerate() {
        if dropin.contents.is_some() && dropin.contents_local.is_some() {
            report.add_error(
                path.append("dropins").append(i).append("contents_local"),
                ConfigError::TooManySystemdSources,
            );
        }
    }
}
