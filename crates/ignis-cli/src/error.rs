//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use colored::Colorize;
use ignis_core::{EntryKind, Report};
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (standard streams, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from ignis-core library
    #[error("{0}")]
    Core(#[from] ignis_core::Error),

    /// Input file not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Input or output file could not be accessed
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Wrap an error from reading or writing `path`
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::File { path, source }
        }
    }

    /// Get the exit code for this error
    ///
    /// 1 when the config itself was rejected, 2 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(core) if core.report().is_some() => 1,
            _ => 2,
        }
    }

    /// The diagnostics report behind this error, if any
    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Core(core) => core.report(),
            _ => None,
        }
    }
}

/// Format a report, one line per entry
pub fn format_report(report: &Report, use_color: bool) -> String {
    report
        .iter()
        .map(|entry| {
            let line = entry.to_string();
            if !use_color {
                return line;
            }
            let kind = entry.kind.to_string();
            let rest = &line[kind.len()..];
            let kind = match entry.kind {
                EntryKind::Error => kind.red().bold(),
                EntryKind::Warning => kind.yellow().bold(),
            };
            format!("{}{}", kind, rest)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let headline = if use_color {
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };
    match error.report().filter(|report| !report.is_empty()) {
        Some(report) => format!("{}\n{}", format_report(report, use_color), headline),
        None => headline,
    }
}
