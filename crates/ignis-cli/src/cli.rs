//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API and maps
//! the flags onto the engine's translation options.

use clap::Parser;
use ignis_core::{TranslateBytesOptions, TranslateOptions};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Ignis - transpile YAML provisioning configs to Ignition JSON
///
/// Reads a config from INPUT (or standard input) and writes the resulting
/// Ignition config, or an OpenShift MachineConfig, to standard output.
#[derive(Parser, Debug)]
#[command(name = "ignis", version, author, about, long_about = None)]
pub struct Cli {
    /// Source config to translate; "-" or nothing reads standard input
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Directory that local file references are resolved against
    #[arg(short = 'd', long, value_name = "DIR")]
    pub files_dir: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(short, long)]
    pub pretty: bool,

    /// Fail on warnings as well as errors
    #[arg(short, long)]
    pub strict: bool,

    /// Emit a bare Ignition config instead of a variant wrapper
    #[arg(short, long)]
    pub raw: bool,

    /// Write the output to a file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not gzip embedded file contents automatically
    #[arg(long)]
    pub no_compress: bool,

    /// Log every translation and check that each output field is traced
    #[arg(long, hide = true)]
    pub debug_translations: bool,

    /// List the supported variants and versions, then exit
    #[arg(long)]
    pub list_variants: bool,

    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress warnings
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored diagnostics should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stderr().is_terminal()
    }

    /// The input path, or `None` for standard input
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|path| path.as_os_str() != "-")
    }

    /// Translation options selected by the flags
    pub fn translate_options(&self) -> TranslateBytesOptions {
        let mut translate = TranslateOptions {
            no_resource_auto_compression: self.no_compress,
            debug_print_translations: self.debug_translations,
            ..Default::default()
        };
        if let Some(dir) = &self.files_dir {
            translate = translate.with_files_dir(dir);
        }
        TranslateBytesOptions {
            translate,
            pretty: self.pretty,
            strict: self.strict,
            raw: self.raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::parse_from([
            "ignis", "-d", "files", "--pretty", "--strict", "--raw", "--no-compress", "config.bu",
        ]);
        let options = cli.translate_options();
        assert!(options.pretty && options.strict && options.raw);
        assert!(options.translate.no_resource_auto_compression);
        assert_eq!(options.translate.files_dir, Some(PathBuf::from("files")));
        assert_eq!(cli.input_path(), Some(&PathBuf::from("config.bu")));
    }

    #[test]
    fn test_stdin_input() {
        assert!(Cli::parse_from(["ignis"]).input_path().is_none());
        assert!(Cli::parse_from(["ignis", "-"]).input_path().is_none());
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["ignis", "-vv"]);
        assert_eq!(cli.verbosity_level(), 2);

        let quiet = Cli::parse_from(["ignis", "--quiet"]);
        assert_eq!(quiet.verbosity_level(), 0);
        assert!(Cli::try_parse_from(["ignis", "-q", "-v"]).is_err());
    }
}
