//! Terminal presentation helpers for the CLI.

pub mod output_format;
