// logfilter-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot filtering outside a long-running host.
//! Builds an engine for the given rule set through the shared compiler cache
//! and runs a whole block of text through it.

use crate::config::RuleSet;
use crate::engines::build_engine;
use crate::sanitizers::compiler::PatternCompiler;

/// Filters every line of `content` with `rule_set`, keeping line endings.
///
/// # Arguments
///
/// * `rule_set` - The configuration to apply (disabled sets return `content` unchanged).
/// * `content` - The text to filter, possibly spanning several lines.
pub fn headless_filter_string(rule_set: &RuleSet, content: &str) -> String {
    let engine = build_engine(rule_set.clone(), PatternCompiler::global());
    engine.filter_text(content)
}
