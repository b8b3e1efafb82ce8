//! Error types for the Ignis core library
//!
//! Two layers live here. [`ConfigError`] is the taxonomy of problems found in
//! a source config; each value renders to a stable message and is recorded in a
//! [`Report`] against a path rather than returned. [`Error`] is what the public
//! entry points return once a report turns fatal, and always carries that
//! report so callers can print every finding with its YAML location.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::report::Report;
use thiserror::Error;

/// Problems found while parsing, validating or translating a source config
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    // source parse
    #[error("error parsing variant; must be specified")]
    NoVariant,
    #[error("error parsing version; must be a valid semver")]
    InvalidVersion,
    #[error("No translator exists for variant {variant} with version {version}")]
    UnknownVersion { variant: String, version: String },
    #[error("{0}")]
    Unmarshal(String),
    #[error("Unused key {0}")]
    UnusedKey(String),

    // source semantics
    #[error("only one of the following can be set: inline, local, source")]
    TooManyResourceSources,
    #[error("local is required")]
    TreeNoLocal,
    #[error("unreasonable mode would be reasonable if specified in octal; remember to add a leading zero")]
    DecimalMode,
    #[error("path is required if with_mount_unit is true")]
    MountUnitNoPath,
    #[error("format is required if with_mount_unit is true")]
    MountUnitNoFormat,
    #[error("layout must be one of: aarch64, ppc64le, x86_64")]
    UnknownBootDeviceLayout,
    #[error("mirroring requires at least two devices")]
    TooFewMirrorDevices,
    #[error("only one of the following can be set: contents, contents_local")]
    TooManySystemdSources,
    #[error("field \"name\" is required")]
    ExtensionNameRequired,
    #[error("metadata.name is required")]
    NameRequired,
    #[error("machineconfiguration.openshift.io/role label is required")]
    RoleRequired,
    #[error("must be empty, \"default\", or \"realtime\"")]
    InvalidKernelType,

    // resource resolution
    #[error("local file paths are relative to a files directory that must be specified with -d/--files-dir")]
    NoFilesDir,
    #[error("local file path traverses outside the files directory")]
    FilesDirEscape,
    #[error("trees may only contain files, directories, and symlinks")]
    FileType,
    #[error("root of tree must be a directory")]
    TreeNotDirectory,
    /// Underlying OS error, already formatted as `open <path>: <reason>`
    #[error("{0}")]
    Io(String),
    #[error("rendering {name}: {detail}")]
    Template { name: String, detail: String },

    // translation and target
    #[error("matching filesystem node has existing contents or different type")]
    NodeExists,
    #[error("source config is invalid")]
    InvalidSourceConfig,
    #[error("config generated was invalid")]
    InvalidGeneratedConfig,
    #[error("directories are not supported in this spec version")]
    DirectorySupport,
    #[error("links are not supported in this spec version")]
    LinkSupport,
    #[error("groups are not supported in this spec version")]
    GroupSupport,
    #[error("users other than \"core\" are not supported in this spec version")]
    UserNameSupport,
    #[error("user field \"{0}\" is not supported in this spec version")]
    UserFieldSupport(String),
    #[error("btrfs is not supported in this spec version")]
    BtrfsSupport,
    #[error("format \"none\" is not supported in this spec version")]
    FilesystemNoneSupport,
    #[error("appending to files is not supported in this spec version")]
    FileAppendSupport,
    #[error("compression is not supported in this spec version")]
    FileCompressionSupport,
    #[error("file HTTP headers are not supported in this spec version")]
    FileHeaderSupport,
    #[error("file contents source must be data URL in this spec version")]
    FileSchemeSupport,
    #[error("this field cannot be used for kernel arguments in this spec version; use openshift.kernel_arguments instead")]
    KernelArgumentSupport,
    #[error("disk customization is not supported in this spec version")]
    DiskSupport,
    #[error("filesystem customization is not supported in this spec version")]
    FilesystemSupport,
    #[error("luks is not supported in this spec version")]
    LuksSupport,
    #[error("raid is not supported in this spec version")]
    RaidSupport,
    #[error("clevis is not supported in this spec version")]
    ClevisSupport,
    #[error("incorrect partition number; a new partition will be created using reserved label")]
    WrongPartitionNumber,

    // elision
    #[error("field ignored in raw mode")]
    FieldElided,

    /// Finding from the target schema validator
    #[error("{0}")]
    Target(String),
}

/// Main error type for Ignis operations
#[derive(Error, Debug)]
pub enum Error {
    /// The source config produced a fatal report
    #[error("source config is invalid")]
    InvalidSourceConfig { report: Report },

    /// Translation succeeded but the target validator rejected the result
    #[error("config generated was invalid")]
    InvalidGeneratedConfig { report: Report },

    /// The variant or version could not be determined or has no translator
    #[error("{kind}")]
    Dispatch { kind: ConfigError, report: Report },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The diagnostics report attached to this error, if any
    pub fn report(&self) -> Option<&Report> {
        match self {
            Error::InvalidSourceConfig { report }
            | Error::InvalidGeneratedConfig { report }
            | Error::Dispatch { report, .. } => Some(report),
            _ => None,
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::TooManyResourceSources.to_string(),
            "only one of the following can be set: inline, local, source"
        );
        assert_eq!(
            ConfigError::UnknownVersion {
                variant: "fcos".to_string(),
                version: "9.9.9".to_string(),
            }
            .to_string(),
            "No translator exists for variant fcos with version 9.9.9"
        );
        assert_eq!(ConfigError::UnusedKey("foo".into()).to_string(), "Unused key foo");
        assert_eq!(
            ConfigError::UserFieldSupport("home_dir".into()).to_string(),
            "user field \"home_dir\" is not supported in this spec version"
        );
    }

    #[test]
    fn test_error_carries_report() {
        let err = Error::InvalidSourceConfig {
            report: Report::default(),
        };
        assert_eq!(err.to_string(), "source config is invalid");
        assert!(err.report().is_some());

        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(io.report().is_none());
    }

    #[test]
    fn test_internal_from_anyhow() {
        let err = Error::from(anyhow::anyhow!("renderer crashed"));
        assert_eq!(err.to_string(), "Internal error: renderer crashed");
        assert!(err.report().is_none());
    }
}
