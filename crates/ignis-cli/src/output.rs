//! Output writing utilities
//!
//! The translated config goes to standard output or a file; warnings go to
//! standard error so they never end up inside the config.

use crate::error::{format_report, Error, Result};
use ignis_core::{Report, VariantSpec};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

/// Writer for the translated config and its diagnostics
pub struct OutputWriter {
    use_color: bool,
    quiet: bool,
    destination: Option<PathBuf>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(destination: Option<PathBuf>, use_color: bool, quiet: bool) -> Self {
        Self::with_writers(
            destination,
            use_color,
            quiet,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    /// Create an output writer with custom streams
    pub fn with_writers(
        destination: Option<PathBuf>,
        use_color: bool,
        quiet: bool,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            use_color,
            quiet,
            destination,
            stdout,
            stderr,
        }
    }

    /// Write the translated config
    pub fn write_config(&mut self, output: &[u8]) -> Result<()> {
        match &self.destination {
            Some(path) => {
                debug!(path = %path.display(), bytes = output.len(), "writing output file");
                fs::write(path, output).map_err(|e| Error::file(path, e))
            }
            None => {
                self.stdout.write_all(output)?;
                self.stdout.flush()?;
                Ok(())
            }
        }
    }

    /// Print the non-fatal findings of a successful translation
    pub fn write_report(&mut self, report: &Report) -> Result<()> {
        if self.quiet || report.is_empty() {
            return Ok(());
        }
        writeln!(self.stderr, "{}", format_report(report, self.use_color))?;
        Ok(())
    }

    /// List the supported variants with their Ignition versions
    pub fn write_variants(&mut self, variants: &[&VariantSpec]) -> Result<()> {
        for spec in variants {
            writeln!(
                self.stdout,
                "{} {} (Ignition {})",
                spec.variant, spec.version, spec.target
            )?;
        }
        Ok(())
    }
}
