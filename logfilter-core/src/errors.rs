//! errors.rs - Custom error types for the logfilter-core library.
//!
//! Configuration problems, per-rule compilation failures and storage failures
//! are kept apart so callers can apply different policies to each: a parse
//! error rejects a whole update, a compile error only drops one rule, and a
//! storage error is handed back to whoever asked for the load or save.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `logfilter-core` library.
///
/// `#[non_exhaustive]` keeps room for new variants without breaking matches
/// in downstream crates.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FilterError {
    #[error("Invalid filter configuration: {0}")]
    ConfigParse(String),

    #[error("Failed to compile pattern '{0}': {1}")]
    PatternCompile(String, regex::Error),

    #[error("Configuration storage failed: {0}")]
    Storage(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// True for errors raised by a `ConfigGateway` (including raw I/O).
    pub fn is_storage(&self) -> bool {
        matches!(self, FilterError::Storage(_) | FilterError::Io(_))
    }
}

impl From<serde_yml::Error> for FilterError {
    fn from(e: serde_yml::Error) -> Self {
        FilterError::Storage(format!("malformed configuration document: {}", e))
    }
}
