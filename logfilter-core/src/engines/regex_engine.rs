// logfilter-core/src/engines/regex_engine.rs
//! A `FilterEngine` implementation that rewrites lines with the compiled
//! regexp/replacement rules of a `RuleSet`.
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::sync::Arc;

use crate::config::RuleSet;
use crate::engine::FilterEngine;
use crate::sanitizers::compiler::{CompiledRule, CompiledRules, PatternCompiler};

/// Applies `rules` to `line` one after another.
///
/// Each rule replaces every non-overlapping match in the text produced by the
/// rules before it, so a later rule can rewrite an earlier rule's output.
/// Lines no rule matches are returned borrowed, and an empty line stays
/// empty even when a pattern can match the empty string.
pub fn apply_rules<'a>(rules: &[CompiledRule], line: &'a str) -> Cow<'a, str> {
    if line.is_empty() {
        return Cow::Borrowed(line);
    }
    let mut current = Cow::Borrowed(line);
    for rule in rules {
        let replaced = match rule.regex.replace_all(&current, rule.replacement.as_str()) {
            Cow::Owned(text) => Some(text),
            Cow::Borrowed(_) => None,
        };
        if let Some(text) = replaced {
            current = Cow::Owned(text);
        }
    }
    current
}

#[derive(Debug)]
pub struct RegexEngine {
    compiled_rules: Arc<CompiledRules>,
    rule_set: RuleSet,
}

impl RegexEngine {
    /// Builds an engine using the process-wide compiler cache.
    pub fn new(rule_set: RuleSet) -> Self {
        Self::with_compiler(rule_set, PatternCompiler::global())
    }

    pub fn with_compiler(rule_set: RuleSet, compiler: &PatternCompiler) -> Self {
        let compiled_rules = compiler.get_or_compile(&rule_set);
        Self {
            compiled_rules,
            rule_set,
        }
    }

    /// Shares already compiled rules; they must come from `rule_set`.
    pub fn from_compiled(rule_set: RuleSet, compiled_rules: Arc<CompiledRules>) -> Self {
        debug_assert_eq!(rule_set.fingerprint(), compiled_rules.fingerprint);
        Self {
            compiled_rules,
            rule_set,
        }
    }
}

impl FilterEngine for RegexEngine {
    fn filter_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        apply_rules(&self.compiled_rules.rules, line)
    }

    fn is_active(&self) -> bool {
        !self.compiled_rules.is_empty()
    }

    fn compiled_rules(&self) -> Option<&CompiledRules> {
        Some(&self.compiled_rules)
    }

    fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulePair;

    fn engine(pairs: &[(&str, &str)]) -> RegexEngine {
        let set = RuleSet::new(true, false, pairs.iter().map(|(p, r)| RulePair::new(*p, *r)));
        RegexEngine::with_compiler(set, &PatternCompiler::new())
    }

    #[test]
    fn test_password_is_redacted() {
        let engine = engine(&[(r"password=\S+", "password=REDACTED")]);
        assert_eq!(
            engine.filter_line("login password=abc123 ok"),
            "login password=REDACTED ok"
        );
    }

    #[test]
    fn test_rules_apply_sequentially() {
        let engine = engine(&[("A", "B"), ("B", "C")]);
        assert_eq!(engine.filter_line("A"), "C");
    }

    #[test]
    fn test_every_match_is_replaced() {
        let engine = engine(&[(r"\d", "#")]);
        assert_eq!(engine.filter_line("a1b22c333"), "a#b##c###");
    }

    #[test]
    fn test_capture_groups_expand() {
        let engine = engine(&[(r"(user)=(\w+)", "$1=<$2>")]);
        assert_eq!(engine.filter_line("user=alice"), "user=<alice>");
    }

    #[test]
    fn test_unmatched_line_is_borrowed() {
        let engine = engine(&[("secret", "****")]);
        assert!(matches!(engine.filter_line("nothing here"), Cow::Borrowed("nothing here")));
        assert!(matches!(engine.filter_line(""), Cow::Borrowed("")));
    }

    #[test]
    fn test_empty_line_stays_empty_with_empty_matching_patterns() {
        let engine = engine(&[("x*", "Z"), ("^", ">"), (".*", "all")]);
        assert!(matches!(engine.filter_line(""), Cow::Borrowed("")));

        let engine = self::engine(&[("x*", "Z")]);
        assert_eq!(engine.filter_line("ab"), "ZaZbZ");
    }

    #[test]
    fn test_filtered_line_is_a_fixed_point() {
        let engine = engine(&[(r"token=\w+", "token=[MASKED]")]);
        let once = engine.filter_line("use token=abc now").into_owned();
        let twice = engine.filter_line(&once).into_owned();
        assert_eq!(once, "use token=[MASKED] now");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_text_keeps_line_endings() {
        let engine = engine(&[("key", "***")]);
        let out = engine.filter_text("key one\r\nno match\nlast key");
        assert_eq!(out, "*** one\r\nno match\nlast ***");
    }

    #[test]
    fn test_empty_rule_set_is_inactive() {
        let engine = engine(&[]);
        assert!(!engine.is_active());
        assert_eq!(engine.filter_line("unchanged"), "unchanged");
    }
}
