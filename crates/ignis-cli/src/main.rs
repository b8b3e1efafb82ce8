//! Ignis CLI - Command-line interface for transpiling provisioning configs
//!
//! Reads a YAML source config, translates it with ignis-core and writes the
//! resulting Ignition JSON. Warnings and errors are printed to standard error
//! with the YAML line and column they refer to.

mod cli;
mod error;
mod logging;
mod output;

use cli::Cli;
use colored::control;
use error::{Error, Result};
use ignis_core::{supported_variants, translate_bytes};
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::io::Read;
use std::process;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    // Initialize logging
    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
fn run(cli: Cli) -> Result<()> {
    let mut output = OutputWriter::new(cli.output.clone(), cli.use_color(), cli.quiet);

    if cli.list_variants {
        return output.write_variants(&supported_variants());
    }

    let input = read_input(&cli)?;
    let options = cli.translate_options();
    let source = cli
        .input_path()
        .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());
    tracing::info!(
        input = %source,
        strict = options.strict,
        raw = options.raw,
        "Translating config"
    );

    let transpiled = {
        let timer = Timer::new("translate");
        let _entered = timer.enter();
        translate_bytes(&input, &options)?
    };
    output.write_report(&transpiled.report)?;
    output.write_config(&transpiled.output)
}

fn read_input(cli: &Cli) -> Result<Vec<u8>> {
    match cli.input_path() {
        Some(path) => std::fs::read(path).map_err(|e| Error::file(path, e)),
        None => {
            let mut input = Vec::new();
            std::io::stdin().read_to_end(&mut input)?;
            Ok(input)
        }
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
