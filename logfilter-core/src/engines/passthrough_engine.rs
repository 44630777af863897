// logfilter-core/src/engines/passthrough_engine.rs
//! The engine used while filtering is switched off globally.
//!
//! It never compiles or matches anything; every line comes back borrowed.

use std::borrow::Cow;

use crate::config::RuleSet;
use crate::engine::FilterEngine;
use crate::sanitizers::compiler::CompiledRules;

#[derive(Debug, Default)]
pub struct PassthroughEngine {
    rule_set: RuleSet,
}

impl PassthroughEngine {
    pub fn new(rule_set: RuleSet) -> Self {
        Self { rule_set }
    }
}

impl FilterEngine for PassthroughEngine {
    fn filter_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(line)
    }

    fn filter_text(&self, content: &str) -> String {
        content.to_string()
    }

    fn is_active(&self) -> bool {
        false
    }

    fn compiled_rules(&self) -> Option<&CompiledRules> {
        None
    }

    fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }
}
