//! Options controlling a translation
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Hook applied to every inline body and local file body before it is
/// embedded in the target
///
/// `name` identifies the body: the source path of an `inline` field or the
/// relative path of a `local` file.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, name: &str, body: &str) -> Result<String, String>;
}

/// Renderer that returns every body unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRenderer;

impl TemplateRenderer for IdentityRenderer {
    fn render(&self, _name: &str, body: &str) -> Result<String, String> {
        Ok(body.to_string())
    }
}

/// Options for translating a parsed source config
#[derive(Clone, Default)]
pub struct TranslateOptions {
    /// Directory `local:` paths are resolved against
    pub files_dir: Option<PathBuf>,
    /// Never gzip inline or local contents automatically
    pub no_resource_auto_compression: bool,
    /// Log the translation set and verify it covers the output
    pub debug_print_translations: bool,
    pub renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl fmt::Debug for TranslateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslateOptions")
            .field("files_dir", &self.files_dir)
            .field("no_resource_auto_compression", &self.no_resource_auto_compression)
            .field("debug_print_translations", &self.debug_print_translations)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl TranslateOptions {
    pub fn with_files_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.files_dir = Some(dir.into());
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }
}

/// Options for [`crate::translate_bytes`]
#[derive(Debug, Clone, Default)]
pub struct TranslateBytesOptions {
    pub translate: TranslateOptions,
    /// Indent the JSON output
    pub pretty: bool,
    /// Fail on warnings and on unknown keys
    pub strict: bool,
    /// Emit the bare Ignition config instead of a variant wrapper
    pub raw: bool,
}
