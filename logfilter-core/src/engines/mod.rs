// logfilter-core/src/engines/mod.rs
//! This module contains the `FilterEngine` implementations.
//!
//! `RegexEngine` does the actual rewriting; `PassthroughEngine` stands in when
//! filtering is disabled so that no pattern is ever compiled in that case.
//! [`build_engine`] picks between them from the rule set's master switch.

pub mod passthrough_engine;
pub mod regex_engine;

use log::debug;
use std::sync::Arc;

use crate::config::RuleSet;
use crate::engine::FilterEngine;
use crate::sanitizers::compiler::PatternCompiler;
use passthrough_engine::PassthroughEngine;
use regex_engine::RegexEngine;

/// Builds the engine matching `rule_set.global_enabled()`.
pub fn build_engine(rule_set: RuleSet, compiler: &PatternCompiler) -> Arc<dyn FilterEngine> {
    if rule_set.global_enabled() {
        debug!("Filtering enabled, building regex engine.");
        Arc::new(RegexEngine::with_compiler(rule_set, compiler))
    } else {
        debug!("Filtering disabled globally, using pass-through engine.");
        Arc::new(PassthroughEngine::new(rule_set))
    }
}
