//! Ignis Core - transpiler from human-friendly YAML provisioning configs to
//! Ignition JSON
//!
//! A source document names a `variant` (fcos, flatcar, openshift, fiot) and a
//! `version`; together they select the Ignition spec version of the output and
//! the variant-specific sugar that is accepted on top of the shared schema.
//!
//! # Main Components
//!
//! - **Bytes facade**: [`translate_bytes`] runs the whole pipeline
//! - **Reports**: every diagnostic carries a source path and, where the YAML
//!   has one, a line and column
//! - **Translation sets**: provenance from each target path back to the
//!   source path it came from
//! - **Variants**: boot device planning, OS extensions, MachineConfig
//!   wrapping and per-variant field support
//!
//! # Example
//!
//! ```no_run
//! use ignis_core::{translate_bytes, TranslateBytesOptions};
//!
//! fn example() -> ignis_core::Result<()> {
//!     let input = b"variant: fcos\nversion: 1.5.0\n";
//!     let transpiled = translate_bytes(input, &TranslateBytesOptions::default())?;
//!     println!("{}", String::from_utf8_lossy(&transpiled.output));
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod bytes;
pub mod error;
pub mod options;
pub mod path;
pub mod report;
pub mod resource;
pub mod translation;
pub mod util;
pub mod variants;
pub mod yaml;

// Re-export main types for convenience
pub use bytes::{translate_bytes, Transpiled};
pub use error::{ConfigError, Error, Result};
pub use options::{IdentityRenderer, TemplateRenderer, TranslateBytesOptions, TranslateOptions};
pub use path::{Path, Schema};
pub use report::{Entry, EntryKind, Marker, Report};
pub use translation::{Translated, Translation, TranslationSet};
pub use variants::{lookup, supported_variants, Document, VariantSpec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
