//! This file defines the command-line interface (CLI) for the logfilter
//! application, including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "logfilter",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Filter console log output through regexp replacement rules",
    long_about = "logfilter rewrites console log output line by line using an ordered list of regexp/replacement pairs, for example to mask credentials before build logs are archived or shared. The rules are stored in a configuration file that can be updated from a JSON form payload.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Location of the stored filter configuration.
    #[arg(
        long = "store",
        value_name = "FILE",
        env = "LOGFILTER_CONFIG",
        global = true,
        help = "Path of the stored filter configuration (YAML)."
    )]
    pub store: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `logfilter` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filters files or stdin line by line.
    #[command(about = "Filters files or stdin line by line with the configured rules.")]
    Filter(FilterCommand),

    /// Inspects or updates the stored configuration.
    #[command(subcommand, about = "Inspects or updates the stored filter configuration.")]
    Config(ConfigCommand),
}

/// Arguments for the `filter` command.
#[derive(Parser, Debug)]
pub struct FilterCommand {
    /// Input files (reads from stdin if none are given).
    #[arg(value_name = "FILE", help = "Input files; stdin is read when none are given.")]
    pub inputs: Vec<PathBuf>,

    /// Write filtered output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", conflicts_with = "output_dir", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Write each input's filtered output into this directory.
    #[arg(long = "output-dir", value_name = "DIR", help = "Filter every input concurrently into a file of the same name in DIR.")]
    pub output_dir: Option<PathBuf>,

    /// Use this form payload instead of the stored configuration.
    #[arg(long = "form", value_name = "FILE", help = "Use a JSON form payload instead of the stored configuration.")]
    pub form: Option<PathBuf>,

    /// Flush after every line (useful when tailing live output).
    #[arg(long = "line-buffered", help = "Flush the --output file after every line (stdout is always flushed per line).")]
    pub line_buffered: bool,
}

/// Subcommands for the `config` command.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    #[command(about = "Prints the stored configuration.")]
    Show {
        /// Print as JSON instead of text.
        #[arg(long, help = "Print the configuration as JSON.")]
        json: bool,
    },
    #[command(about = "Replaces the stored configuration with a JSON form payload.")]
    Set {
        /// The form payload file, or `-` for stdin.
        #[arg(value_name = "FORM", help = "JSON form payload file, or '-' to read stdin.")]
        form: PathBuf,
    },
    #[command(about = "Lists the built-in default rules.")]
    Defaults,
}
