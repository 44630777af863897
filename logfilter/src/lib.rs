// logfilter/src/lib.rs
//! # logfilter CLI
//!
//! Command-line front end for `logfilter-core`: filters log streams through the
//! stored regexp replacement rules and manages that stored configuration.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
