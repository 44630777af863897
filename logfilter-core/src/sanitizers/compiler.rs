//! compiler.rs - Manages the compilation and caching of replacement rules.
//!
//! This module converts a `RuleSet` into `CompiledRules`, the read-only form
//! the line engine works from. A `PatternCompiler` memoizes results keyed by
//! the rule set's fingerprint, so repeated filtering passes against an
//! unchanged configuration reuse the same `Arc<CompiledRules>`.
//!
//! A pattern that fails to compile is skipped with a warning; the remaining
//! rules are still returned.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{RuleOrigin, RuleSet};
use crate::errors::FilterError;

/// Upper bound on distinct rule sets kept in one compiler's cache.
pub const MAX_CACHED_RULE_SETS: usize = 32;

/// Compiled size limit handed to the regex builder (10 MB).
const COMPILED_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Represents a single compiled replacement rule.
#[derive(Debug)]
pub struct CompiledRule {
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// Text substituted for every match; may reference capture groups.
    pub replacement: String,
    pub origin: RuleOrigin,
}

/// The ordered rules compiled from one `RuleSet`.
#[derive(Debug)]
pub struct CompiledRules {
    /// Rules in application order.
    pub rules: Vec<CompiledRule>,
    /// Fingerprint of the `RuleSet` these rules were built from.
    pub fingerprint: String,
    /// Number of rules dropped because their pattern did not compile.
    pub skipped: usize,
}

impl CompiledRules {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

lazy_static! {
    static ref GLOBAL_COMPILER: PatternCompiler = PatternCompiler::new();
}

/// Compiles rule sets and caches the result per rule set fingerprint.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: RwLock<HashMap<String, Arc<CompiledRules>>>,
    compilations: AtomicUsize,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide compiler shared by the convenience entry points.
    pub fn global() -> &'static PatternCompiler {
        &GLOBAL_COMPILER
    }

    /// Compiles `rule_set` without consulting the cache.
    pub fn compile(&self, rule_set: &RuleSet) -> CompiledRules {
        self.compilations.fetch_add(1, Ordering::Relaxed);
        compile_rules(rule_set)
    }

    /// Gets the compiled rules for `rule_set` from the cache or compiles them.
    pub fn get_or_compile(&self, rule_set: &RuleSet) -> Arc<CompiledRules> {
        let cache_key = rule_set.fingerprint();

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(rules) = cache.get(&cache_key) {
                debug!("Serving compiled rules from cache for key: {}", &cache_key);
                return Arc::clone(rules);
            }
        }

        debug!("Compiled rules not found in cache. Compiling now.");
        let compiled = Arc::new(self.compile(rule_set));

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.len() >= MAX_CACHED_RULE_SETS {
            debug!("Compiled rule cache is full ({} entries), clearing.", cache.len());
            cache.clear();
        }
        // Another thread may have raced us here; keep whichever landed first.
        let entry = cache.entry(cache_key).or_insert_with(|| Arc::clone(&compiled));
        Arc::clone(entry)
    }

    /// How many cache misses resulted in an actual compilation.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Builds a single pattern with the limits every rule is compiled under.
pub fn compile_pattern(pattern: &str) -> Result<Regex, FilterError> {
    RegexBuilder::new(pattern)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| FilterError::PatternCompile(pattern.to_string(), e))
}

/// Compiles the effective pairs of `rule_set` in application order.
///
/// Rules whose pattern does not compile are logged and left out.
pub fn compile_rules(rule_set: &RuleSet) -> CompiledRules {
    let effective = rule_set.effective_pairs();
    debug!("Starting compilation of {} rules.", effective.len());

    let mut rules = Vec::with_capacity(effective.len());
    let mut skipped = 0;

    for (origin, pair) in effective {
        match compile_pattern(pair.pattern()) {
            Ok(regex) => {
                log::debug!(
                    target: "logfilter_core::compiler",
                    "Pattern '{}' compiled successfully.",
                    pair.pattern()
                );
                rules.push(CompiledRule {
                    regex,
                    replacement: pair.replacement().to_string(),
                    origin,
                });
            }
            Err(e) => {
                warn!("Skipping {:?} rule: {}", origin, e);
                skipped += 1;
            }
        }
    }

    debug!(
        "Finished compiling rules. Total compiled: {}, skipped: {}.",
        rules.len(),
        skipped
    );
    CompiledRules {
        rules,
        fingerprint: rule_set.fingerprint(),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_pairs, RulePair};
    use test_log::test;

    fn rule_set(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::new(true, false, pairs.iter().map(|(p, r)| RulePair::new(*p, *r)))
    }

    #[test]
    fn test_compile_preserves_order() {
        let compiled = compile_rules(&rule_set(&[("a", "1"), ("b", "2"), ("c", "3")]));
        let patterns: Vec<&str> = compiled.rules.iter().map(|r| r.regex.as_str()).collect();
        assert_eq!(patterns, ["a", "b", "c"]);
        assert_eq!(compiled.skipped, 0);
    }

    #[test]
    fn test_invalid_pattern_is_skipped_not_fatal() {
        let compiled = compile_rules(&rule_set(&[("first", "1"), ("(broken", "x"), ("last", "2")]));
        assert_eq!(compiled.len(), 2);
        assert_eq!(compiled.skipped, 1);
        assert_eq!(compiled.rules[0].regex.as_str(), "first");
        assert_eq!(compiled.rules[1].regex.as_str(), "last");
    }

    #[test]
    fn test_compile_pattern_reports_pattern() {
        let err = compile_pattern("[z-a]").unwrap_err();
        assert!(matches!(err, FilterError::PatternCompile(ref p, _) if p == "[z-a]"));
    }

    #[test]
    fn test_defaults_compile_before_user_rules() {
        let set = RuleSet::new(true, true, vec![RulePair::new("user", "U")]);
        let compiled = compile_rules(&set);
        assert_eq!(compiled.len(), default_pairs().len() + 1);
        assert!(compiled.rules[..default_pairs().len()]
            .iter()
            .all(|r| r.origin == RuleOrigin::Default));
        assert_eq!(compiled.rules.last().map(|r| r.origin), Some(RuleOrigin::User));
    }

    #[test]
    fn test_cache_reuses_compiled_rules() {
        let compiler = PatternCompiler::new();
        let set = rule_set(&[("x", "y")]);
        let first = compiler.get_or_compile(&set);
        let second = compiler.get_or_compile(&set.clone());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.compilations(), 1);

        let changed = rule_set(&[("x", "z")]);
        let third = compiler.get_or_compile(&changed);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(compiler.compilations(), 2);
        assert_eq!(compiler.cached_len(), 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let compiler = PatternCompiler::new();
        for i in 0..=MAX_CACHED_RULE_SETS {
            let pattern = format!("p{}", i);
            compiler.get_or_compile(&rule_set(&[(pattern.as_str(), "")]));
        }
        assert!(compiler.cached_len() <= MAX_CACHED_RULE_SETS);
    }
}
