// logfilter-core/src/engine.rs
//! Defines the core `FilterEngine` trait.
//!
//! A `FilterEngine` turns one line of console output into its filtered form.
//! Engines are built once per configuration snapshot and shared between
//! threads, so implementations hold only read-only state.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;

use crate::config::RuleSet;
use crate::sanitizers::compiler::CompiledRules;

/// A trait that defines the core functionality of a line filtering engine.
pub trait FilterEngine: Send + Sync + std::fmt::Debug {
    /// Filters a single line (without its terminator).
    ///
    /// Returns the input borrowed when nothing changed.
    fn filter_line<'a>(&self, line: &'a str) -> Cow<'a, str>;

    /// Filters multi-line content line by line, keeping `\n` and `\r\n`
    /// terminators exactly as they were.
    fn filter_text(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        for segment in content.split_inclusive('\n') {
            let (body, terminator) = match segment.strip_suffix("\r\n") {
                Some(body) => (body, "\r\n"),
                None => match segment.strip_suffix('\n') {
                    Some(body) => (body, "\n"),
                    None => (segment, ""),
                },
            };
            out.push_str(&self.filter_line(body));
            out.push_str(terminator);
        }
        out
    }

    /// Whether this engine can change any line at all.
    fn is_active(&self) -> bool;

    /// The compiled rules backing this engine, if it matches anything.
    fn compiled_rules(&self) -> Option<&CompiledRules>;

    /// The configuration the engine was built from.
    fn rule_set(&self) -> &RuleSet;
}
