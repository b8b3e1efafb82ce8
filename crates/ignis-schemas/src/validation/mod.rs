//! Validation module for Ignition target configs
//!
//! The validator walks a typed [`Config`] and collects every finding against
//! the JSON path of the offending field. Rules depend on the spec version the
//! config declares in `ignition.version`:
//!
//! - **Structure**: absolute paths, required names, duplicate entries
//! - **Values**: URL schemes, hash formats, file modes, filesystem formats
//! - **Version floors**: fields introduced after the declared version
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod error;
pub mod ignition;

// Re-export commonly used types
pub use base::{PathSegment, SchemaValidator, ValidationContext, ValidationHelpers};
pub use error::{Severity, ValidationError, ValidationErrors};

use crate::ignition::{is_supported_version, Config};
use semver::Version;

/// Validate a config against the version it declares
///
/// An unparsable or unsupported `ignition.version` is reported at
/// `ignition.version` and no further rules run.
///
/// # Examples
///
/// ```rust
/// use ignis_schemas::ignition::{Config, File};
/// use ignis_schemas::validate;
///
/// let mut config = Config::default();
/// config.ignition.version = "3.3.0".to_string();
/// config.storage.files.push(File {
///     path: "relative/path".to_string(),
///     ..Default::default()
/// });
///
/// let errors = validate(&config);
/// assert!(errors.has_errors());
/// assert_eq!(errors.iter().next().unwrap().to_string(),
///     "error at $.storage.files.0.path: path not absolute");
/// ```
pub fn validate(config: &Config) -> ValidationErrors {
    let context = ValidationContext::new(Version::new(0, 0, 0))
        .child("ignition")
        .child("version");
    let declared = &config.ignition.version;
    match Version::parse(declared) {
        Ok(version) if is_supported_version(declared) => validate_for_version(config, &version),
        Ok(_) => ValidationErrors::from(context.error(format!(
            "unsupported config version {}",
            declared
        ))),
        Err(_) => ValidationErrors::from(context.error("invalid config version")),
    }
}

/// Validate a config as if it declared `version`
pub fn validate_for_version(config: &Config, version: &Version) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    config.validate_with_context(&ValidationContext::new(version.clone()), &mut errors);
    errors
}
