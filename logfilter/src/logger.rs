// logfilter/src/logger.rs
//! Logging setup for the CLI.
//!
//! Everything is logged to stderr so stdout only ever carries filtered lines.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger`, honoring `RUST_LOG` unless `level` is given.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.target(Target::Stderr).format_timestamp(None);
    let _ = builder.try_init();
}

/// Maps the `--quiet` / `--debug` flags to a level override.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
