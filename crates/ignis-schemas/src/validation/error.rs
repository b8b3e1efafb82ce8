//! Validation error types for Ignition target configs
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::validation::base::PathSegment;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Severity of a target validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The config will be rejected by Ignition
    Error,
    /// The config is accepted but probably not what was meant
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding anchored at a target path
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path of the offending field, from the config root
    pub path: Vec<PathSegment>,
    /// Human-readable error message
    pub message: String,
    /// Whether the finding is fatal
    pub severity: Severity,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at $", self.severity)?;
        for segment in &self.path {
            write!(f, ".{}", segment)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl ValidationError {
    /// Create a new fatal validation error
    pub fn new<M>(path: Vec<PathSegment>, message: M) -> Self
    where
        M: Into<String>,
    {
        Self {
            path,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Create a non-fatal finding
    pub fn warning<M>(path: Vec<PathSegment>, message: M) -> Self
    where
        M: Into<String>,
    {
        Self {
            path,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Ordered collection of validation findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Findings in the order they were produced
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation produced {} finding(s):", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Create a new validation errors collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a finding to the collection
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Check if there are any findings at all
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of findings
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if any finding is fatal
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(ValidationError::is_error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Convert to result - Ok if no fatal findings, Err otherwise
    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}
