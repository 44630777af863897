// logfilter-core/src/lib.rs
//! # logfilter Core Library
//!
//! `logfilter-core` filters console log output through an ordered list of
//! regexp/replacement pairs. It normalizes submitted configuration into a
//! `RuleSet`, compiles the rules once per configuration, and applies them
//! lazily to streams of log lines.
//!
//! ## Modules
//!
//! * `config`: `RulePair`, `RuleSet`, form normalization and the built-in default pairs.
//! * `sanitizers`: Rule compilation and the fingerprint-keyed compiled-rule cache.
//! * `engine`: The `FilterEngine` trait.
//! * `engines`: `RegexEngine` and `PassthroughEngine`.
//! * `stream`: `StreamFilter`, the lazy line-by-line adapter, and `filter_stream`.
//! * `gateway`: The `ConfigGateway` trait with file and in-memory stores.
//! * `active`: `ActiveConfig`, the atomically swapped live configuration.
//! * `headless`: One-shot filtering of a block of text.
//! * `errors`: `FilterError`.
//!
//! ## Usage Example
//!
//! ```rust
//! use logfilter_core::{filter_stream, RuleSet};
//!
//! let form = serde_json::json!({
//!     "enabledGlobally": true,
//!     "pairs": { "pattern": "password=\\S+", "replacement": "password=REDACTED" }
//! });
//! let rule_set = RuleSet::from_form(&form).unwrap();
//!
//! let lines = ["login password=abc123 ok", "build finished"];
//! let filtered: Vec<String> = filter_stream(&rule_set, lines).collect();
//! assert_eq!(filtered, ["login password=REDACTED ok", "build finished"]);
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`FilterError`]. Configuration errors reject an
//! update as a whole, a pattern that fails to compile only drops that rule,
//! and filtering itself never fails.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod active;
pub mod config;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod gateway;
pub mod headless;
pub mod sanitizers;
pub mod stream;

pub use config::{default_pairs, RuleOrigin, RulePair, RuleSet, MAX_PATTERN_LENGTH};

pub use errors::FilterError;

pub use engine::FilterEngine;

pub use engines::build_engine;
pub use engines::passthrough_engine::PassthroughEngine;
pub use engines::regex_engine::{apply_rules, RegexEngine};

pub use sanitizers::compiler::{compile_rules, CompiledRule, CompiledRules, PatternCompiler};

pub use stream::{filter_stream, FilterLinesExt, StreamFilter};

pub use gateway::{
    default_config_path, load_or_disabled, ConfigGateway, FileConfigGateway, MemoryConfigGateway,
};

pub use active::{ActiveConfig, ConfigSnapshot};

pub use headless::headless_filter_string;
