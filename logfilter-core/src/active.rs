// logfilter-core/src/active.rs
//! The live filter configuration of a running host.
//!
//! `ActiveConfig` owns the current `ConfigSnapshot` (rule set plus the engine
//! built from it) behind an `Arc`. An update validates and persists the new
//! rule set first and only then swaps the reference, so filtering already in
//! progress keeps using the snapshot it started with and a rejected update
//! leaves the previous configuration in force.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::RuleSet;
use crate::engine::FilterEngine;
use crate::engines::build_engine;
use crate::errors::FilterError;
use crate::gateway::{load_or_disabled, ConfigGateway};
use crate::sanitizers::compiler::PatternCompiler;
use crate::stream::StreamFilter;

/// One immutable configuration generation.
#[derive(Debug)]
pub struct ConfigSnapshot {
    pub rule_set: RuleSet,
    pub engine: Arc<dyn FilterEngine>,
}

impl ConfigSnapshot {
    pub fn new(rule_set: RuleSet, compiler: &PatternCompiler) -> Self {
        let engine = build_engine(rule_set.clone(), compiler);
        Self { rule_set, engine }
    }
}

pub struct ActiveConfig {
    gateway: Box<dyn ConfigGateway>,
    compiler: &'static PatternCompiler,
    current: RwLock<Arc<ConfigSnapshot>>,
    // Serializes save-then-swap so the live snapshot always matches storage.
    update_guard: Mutex<()>,
}

impl ActiveConfig {
    /// Loads the stored configuration through `gateway`.
    ///
    /// A storage failure is logged and results in filtering being disabled.
    pub fn load(gateway: Box<dyn ConfigGateway>) -> Self {
        let compiler = PatternCompiler::global();
        let rule_set = load_or_disabled(gateway.as_ref());
        info!(
            "Active filter configuration: enabled={}, defaults={}, {} pair(s).",
            rule_set.global_enabled(),
            rule_set.default_rules_enabled(),
            rule_set.len()
        );
        let snapshot = Arc::new(ConfigSnapshot::new(rule_set, compiler));
        Self {
            gateway,
            compiler,
            current: RwLock::new(snapshot),
            update_guard: Mutex::new(()),
        }
    }

    /// The configuration in force right now.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Applies a submitted configuration form.
    ///
    /// The form is normalized and validated in full; any invalid entry rejects
    /// the whole update with `FilterError::ConfigParse`. A storage failure is
    /// returned as-is. In both cases the previous snapshot stays active.
    pub fn apply_form(&self, form: &serde_json::Value) -> Result<Arc<ConfigSnapshot>, FilterError> {
        let rule_set = RuleSet::from_form(form)?;
        self.install(rule_set)
    }

    /// Replaces the configuration with `rule_set` after validating it.
    pub fn replace(&self, rule_set: RuleSet) -> Result<Arc<ConfigSnapshot>, FilterError> {
        rule_set.validate()?;
        self.install(rule_set)
    }

    /// Filters `lines` with the snapshot current at the time of the call.
    pub fn filter_stream<L>(&self, lines: L) -> StreamFilter<L::IntoIter>
    where
        L: IntoIterator,
        L::Item: Into<String>,
    {
        StreamFilter::with_engine(Arc::clone(&self.snapshot().engine), lines)
    }

    fn install(&self, rule_set: RuleSet) -> Result<Arc<ConfigSnapshot>, FilterError> {
        let _update = self.update_guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.gateway.save(&rule_set)?;
        let snapshot = Arc::new(ConfigSnapshot::new(rule_set, self.compiler));
        debug!("Swapping in configuration {}.", snapshot.rule_set.fingerprint());
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        Ok(snapshot)
    }
}

impl std::fmt::Debug for ActiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveConfig")
            .field("current", &self.snapshot())
            .finish_non_exhaustive()
    }
}
