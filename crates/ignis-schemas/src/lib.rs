//! Ignis Schemas - Ignition target schema definitions and validators
//!
//! This crate provides the typed target side of the Ignis transpiler:
//! - **Ignition**: the Ignition 3.x configuration structures produced by every
//!   variant (one unified structure covering spec versions 3.2.0 through 3.5.0)
//! - **MachineConfig**: the OpenShift wrapper document that embeds an Ignition
//!   config under `spec.config`
//! - **Validation**: the per-version target validator that reports problems
//!   against JSON target paths
//!
//! ## Quick Start
//!
//! ```rust
//! use ignis_schemas::ignition::Config;
//! use ignis_schemas::validate;
//!
//! let mut config = Config::default();
//! config.ignition.version = "3.4.0".to_string();
//!
//! let errors = validate(&config);
//! assert!(!errors.has_errors());
//! ```
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod ignition;
pub mod machine_config;
pub mod validation;

// Re-export commonly used types for convenience
pub use ignition::{is_supported_version, SUPPORTED_VERSIONS};
pub use machine_config::MachineConfig;
pub use validation::{
    validate, validate_for_version, PathSegment, SchemaValidator, Severity, ValidationContext,
    ValidationError, ValidationErrors,
};

/// Serde helper: skip a field when it holds its type's default value
pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}
