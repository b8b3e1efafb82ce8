//! Fedora IoT variant
//!
//! IoT images manage their own storage layout, so disk, RAID, LUKS and
//! filesystem customization is refused.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::{schema, validate_config};
use crate::error::ConfigError;
use crate::options::TranslateOptions;
use crate::path::{Path, Schema};
use crate::report::Report;
use crate::translation::Translated;
use crate::variants::filter::{apply_filters, FieldFilter};
use crate::variants::{into_ignition, translate_base, Document, SourceConfig, VariantSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: String,
    pub version: String,
    #[serde(flatten)]
    pub base: schema::Config,
}

fn filters() -> Vec<FieldFilter> {
    vec![
        FieldFilter::forbid("storage.disks.*", ConfigError::DiskSupport),
        FieldFilter::forbid("storage.filesystems.*", ConfigError::FilesystemSupport),
        FieldFilter::forbid("storage.luks.*", ConfigError::LuksSupport),
        FieldFilter::forbid("storage.raid.*", ConfigError::RaidSupport),
    ]
}

impl SourceConfig for Config {
    fn validate(&self, _spec: &VariantSpec) -> Report {
        validate_config(&self.base, &Path::root(Schema::Source))
    }

    fn translate(
        &self,
        spec: &VariantSpec,
        options: &TranslateOptions,
        _raw: bool,
    ) -> Translated<Option<Document>> {
        let mut translated = translate_base(&self.base, options);
        apply_filters(
            &filters(),
            &translated.value,
            &Path::root(Schema::Target),
            &mut translated.report,
        );
        into_ignition(translated, spec).map(|config| config.map(Document::Ignition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::schema::{Disk, Filesystem, Raid};
    use crate::variants::lookup;
    use pretty_assertions::assert_eq;
    use semver::Version;

    #[test]
    fn test_storage_layout_rejected() {
        let spec = lookup("fiot", &Version::new(1, 0, 0)).unwrap();
        let mut config = Config::default();
        config.base.storage.disks.push(Disk {
            device: "/dev/vdb".into(),
            ..Default::default()
        });
        config.base.storage.raid.push(Raid {
            name: "md0".into(),
            level: Some("raid1".into()),
            devices: vec!["/dev/vdb".into(), "/dev/vdc".into()],
            ..Default::default()
        });
        config.base.storage.filesystems.push(Filesystem {
            device: "/dev/md/md0".into(),
            format: Some("xfs".into()),
            ..Default::default()
        });
        let result = config.translate(spec, &TranslateOptions::default(), false);
        let messages: Vec<String> = result.report.iter().map(|e| e.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                ConfigError::DiskSupport.to_string(),
                ConfigError::RaidSupport.to_string(),
                ConfigError::FilesystemSupport.to_string(),
            ]
        );
    }
}
