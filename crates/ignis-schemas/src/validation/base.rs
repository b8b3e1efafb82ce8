//! Base validation trait and common utilities
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::{ValidationError, ValidationErrors};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a target path: an object field or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Validation context for passing the current path and target version
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Current path from the config root
    pub path: Vec<PathSegment>,
    /// Ignition spec version the config declares
    pub version: Version,
}

impl ValidationContext {
    /// Create a new validation context at the config root
    pub fn new(version: Version) -> Self {
        Self {
            path: Vec::new(),
            version,
        }
    }

    /// Create a child context for an object field
    pub fn child<P: AsRef<str>>(&self, field: P) -> Self {
        let mut path = self.path.clone();
        path.push(PathSegment::Field(field.as_ref().to_string()));
        Self {
            path,
            version: self.version.clone(),
        }
    }

    /// Create a child context for array index
    pub fn child_index(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(PathSegment::Index(index));
        Self {
            path,
            version: self.version.clone(),
        }
    }

    /// Build a fatal error at this context's path
    pub fn error<M: Into<String>>(&self, message: M) -> ValidationError {
        ValidationError::new(self.path.clone(), message)
    }

    /// Build a warning at this context's path
    pub fn warning<M: Into<String>>(&self, message: M) -> ValidationError {
        ValidationError::warning(self.path.clone(), message)
    }

    /// Whether the declared version is at least `major.minor.0`
    pub fn at_least(&self, major: u64, minor: u64) -> bool {
        (self.version.major, self.version.minor) >= (major, minor)
    }
}

/// Base trait for target schema validators
///
/// Implementations append every finding to `errors` instead of stopping at
/// the first one, so a single pass reports all problems in a config.
pub trait SchemaValidator {
    /// Validate with specific context, collecting findings
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors);
}

impl<T: SchemaValidator> SchemaValidator for Vec<T> {
    fn validate_with_context(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        for (i, item) in self.iter().enumerate() {
            item.validate_with_context(&context.child_index(i), errors);
        }
    }
}

/// Helper functions for common validation patterns
pub struct ValidationHelpers;

impl ValidationHelpers {
    /// Require an absolute Unix path
    pub fn validate_absolute_path(
        path: &str,
        context: &ValidationContext,
        errors: &mut ValidationErrors,
    ) {
        if !path.starts_with('/') {
            errors.add(context.error("path not absolute"));
        }
    }

    /// Require a non-empty string field
    pub fn validate_required(
        value: &str,
        message: &str,
        context: &ValidationContext,
        errors: &mut ValidationErrors,
    ) {
        if value.is_empty() {
            errors.add(context.error(message));
        }
    }

    /// Reject a field introduced after the declared spec version
    pub fn validate_since(
        present: bool,
        major: u64,
        minor: u64,
        context: &ValidationContext,
        errors: &mut ValidationErrors,
    ) {
        if present && !context.at_least(major, minor) {
            errors.add(context.error(format!(
                "field not supported in Ignition spec version {}; requires {}.{}.0 or later",
                context.version, major, minor
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_paths() {
        let context = ValidationContext::new(Version::new(3, 4, 0));
        let child = context.child("storage").child("files").child_index(2);
        assert_eq!(
            child.path,
            vec![
                PathSegment::Field("storage".to_string()),
                PathSegment::Field("files".to_string()),
                PathSegment::Index(2),
            ]
        );
    }

    #[test]
    fn test_at_least() {
        let context = ValidationContext::new(Version::new(3, 3, 0));
        assert!(context.at_least(3, 2));
        assert!(context.at_least(3, 3));
        assert!(!context.at_least(3, 4));
    }

    #[test]
    fn test_validate_since() {
        let context = ValidationContext::new(Version::new(3, 2, 0)).child("kernelArguments");
        let mut errors = ValidationErrors::new();
        ValidationHelpers::validate_since(true, 3, 3, &context, &mut errors);
        ValidationHelpers::validate_since(false, 3, 3, &context, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors.errors[0].message.contains("3.2.0"));
    }
}
