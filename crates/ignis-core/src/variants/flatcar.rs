//! Flatcar Container Linux variant
//!
//! The shared schema without Clevis, which Flatcar does not ship.
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
    vec![FieldFilter::forbid("storage.luks.*.clevis", ConfigError::ClevisSupport)]
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
