//! Variant catalog and dispatch
//!
//! Each supported `(variant, version)` pair maps to one Ignition spec
//! version and one source config type. The catalog below is the single list
//! of them; the lookup table is built from it on first use and never changes
//! afterwards.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod boot_device;
pub mod fcos;
pub mod fiot;
pub mod filter;
pub mod fips;
pub mod flatcar;
pub mod openshift;

use crate::base::{self, schema};
use crate::bytes::{translate_source, Transpiled};
use crate::error::{ConfigError, Result};
use crate::options::{TranslateBytesOptions, TranslateOptions};
use crate::path::{Path, Schema, Segment};
use crate::report::Report;
use crate::translation::Translated;
use crate::yaml::Node;
use ignis_schemas::ignition;
use ignis_schemas::validation::PathSegment;
use ignis_schemas::MachineConfig;
use semver::Version;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Runs the whole pipeline for one catalog entry
pub type TranslateFn =
    fn(&VariantSpec, &[u8], &Node, &TranslateBytesOptions) -> Result<Transpiled>;

/// One supported source spec version
#[derive(Clone)]
pub struct VariantSpec {
    pub variant: &'static str,
    pub version: Version,
    /// Ignition spec version of the output
    pub target: Version,
    translate: TranslateFn,
}

impl fmt::Debug for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantSpec")
            .field("variant", &self.variant)
            .field("version", &self.version)
            .field("target", &self.target)
            .finish()
    }
}

impl VariantSpec {
    pub fn translate(&self, input: &[u8], tree: &Node, options: &TranslateBytesOptions) -> Result<Transpiled> {
        (self.translate)(self, input, tree, options)
    }

    /// Whether this spec is at least `major.minor.patch`
    pub fn at_least(&self, major: u64, minor: u64, patch: u64) -> bool {
        self.version >= Version::new(major, minor, patch)
    }
}

const fn entry(
    variant: &'static str,
    version: (u64, u64, u64),
    target: (u64, u64, u64),
    translate: TranslateFn,
) -> VariantSpec {
    VariantSpec {
        variant,
        version: Version::new(version.0, version.1, version.2),
        target: Version::new(target.0, target.1, target.2),
        translate,
    }
}

static CATALOG: &[VariantSpec] = &[
    entry("fcos", (1, 3, 0), (3, 2, 0), translate_source::<fcos::Config>),
    entry("fcos", (1, 4, 0), (3, 3, 0), translate_source::<fcos::Config>),
    entry("fcos", (1, 5, 0), (3, 4, 0), translate_source::<fcos::Config>),
    entry("fcos", (1, 6, 0), (3, 5, 0), translate_source::<fcos::Config>),
    entry("flatcar", (1, 0, 0), (3, 3, 0), translate_source::<flatcar::Config>),
    entry("flatcar", (1, 1, 0), (3, 4, 0), translate_source::<flatcar::Config>),
    entry("openshift", (4, 12, 0), (3, 2, 0), translate_source::<openshift::Config>),
    entry("openshift", (4, 13, 0), (3, 2, 0), translate_source::<openshift::Config>),
    entry("openshift", (4, 14, 0), (3, 4, 0), translate_source::<openshift::Config>),
    entry("openshift", (4, 15, 0), (3, 4, 0), translate_source::<openshift::Config>),
    entry("fiot", (1, 0, 0), (3, 4, 0), translate_source::<fiot::Config>),
];

fn registry() -> &'static BTreeMap<(String, Version), &'static VariantSpec> {
    static REGISTRY: OnceLock<BTreeMap<(String, Version), &'static VariantSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table = BTreeMap::new();
        for spec in CATALOG {
            let key = (spec.variant.to_string(), spec.version.clone());
            if table.insert(key, spec).is_some() {
                panic!("translator for {} {} registered twice", spec.variant, spec.version);
            }
        }
        table
    })
}

/// Find the translator for `variant` at `version`
pub fn lookup(variant: &str, version: &Version) -> std::result::Result<&'static VariantSpec, ConfigError> {
    registry()
        .get(&(variant.to_string(), version.clone()))
        .copied()
        .ok_or_else(|| ConfigError::UnknownVersion {
            variant: variant.to_string(),
            version: version.to_string(),
        })
}

/// Every supported `(variant, version)`, ordered by variant then version
pub fn supported_variants() -> Vec<&'static VariantSpec> {
    registry().values().copied().collect()
}

/// A source config type for one variant
pub trait SourceConfig: Serialize + DeserializeOwned {
    /// Structural checks on the decoded source, reported at source paths
    fn validate(&self, spec: &VariantSpec) -> Report;

    /// Produce the output document
    ///
    /// `raw` asks for a bare Ignition config from variants that would
    /// otherwise wrap it.
    fn translate(
        &self,
        spec: &VariantSpec,
        options: &TranslateOptions,
        raw: bool,
    ) -> Translated<Option<Document>>;
}

/// The document a variant emits
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Ignition(ignition::Config),
    MachineConfig(MachineConfig),
}

impl Document {
    /// The Ignition config inside the document
    pub fn ignition(&self) -> &ignition::Config {
        match self {
            Document::Ignition(config) => config,
            Document::MachineConfig(mc) => &mc.spec.config,
        }
    }

    /// Where the Ignition config sits in the document
    pub fn ignition_prefix(&self) -> Path {
        match self {
            Document::Ignition(_) => Path::root(Schema::Target),
            Document::MachineConfig(_) => Path::target("spec.config"),
        }
    }

    /// Run the target validator, reporting at document paths
    pub fn validate(&self) -> Report {
        let prefix = self.ignition_prefix();
        let mut report = Report::new();
        for finding in ignis_schemas::validate(self.ignition()).iter() {
            let segments = finding.path.iter().map(|segment| match segment {
                PathSegment::Field(name) => Segment::Key(name.clone()),
                PathSegment::Index(i) => Segment::Index(*i),
            });
            let path = Path::new(Schema::Target, segments).prefix(&prefix);
            let message = ConfigError::Target(finding.message.clone());
            if finding.is_error() {
                report.add_error(path, message);
            } else {
                report.add_warning(path, message);
            }
        }
        report
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            Document::Ignition(config) => serde_json::to_value(config),
            Document::MachineConfig(mc) => serde_json::to_value(mc),
        }
    }
}

/// Translate the base schema of a variant, leaving the version unset
pub(crate) fn translate_base(config: &schema::Config, options: &TranslateOptions) -> Translated<Value> {
    base::translate_config(config, options)
}

/// Stamp the target version and convert to a typed Ignition config
pub(crate) fn into_ignition(
    mut translated: Translated<Value>,
    spec: &VariantSpec,
) -> Translated<Option<ignition::Config>> {
    if !translated.value.is_object() {
        translated.value = json!({});
    }
    if let Value::Object(root) = &mut translated.value {
        let ignition = root.entry("ignition").or_insert_with(|| json!({}));
        if let Value::Object(ignition) = ignition {
            ignition.insert("version".into(), json!(spec.target.to_string()));
        }
    }
    let ts = &mut translated.translations;
    ts.add(Path::source("version"), Path::target("ignition.version"));
    if ts.lookup(&Path::target("ignition")).is_none() {
        ts.add(Path::source("version"), Path::target("ignition"));
    }

    match serde_json::from_value::<ignition::Config>(translated.value.clone()) {
        Ok(config) => translated.map(|_| Some(config)),
        Err(err) => {
            translated.report.add_error(
                Path::root(Schema::Source),
                ConfigError::Unmarshal(err.to_string()),
            );
            translated.map(|_| None)
        }
    }
}
