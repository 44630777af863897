//! Configuration management for `logfilter-core`.
//!
//! This module defines the rule model (`RulePair`, `RuleSet`) and the single
//! normalization path that turns a submitted configuration form into a
//! `RuleSet`. Forms may encode the pair list either as one object or as an
//! array of objects depending on how many entries were submitted; both shapes
//! go through the same code. Patterns are validated eagerly here so a broken
//! rule is rejected at configuration time instead of surfacing while filtering.
//!
//! License: MIT OR Apache-2.0

use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::errors::FilterError;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

const DEFAULT_RULES_YAML: &str = include_str!("../config/default_rules.yaml");

lazy_static! {
    static ref DEFAULT_PAIRS: Vec<RulePair> = parse_default_pairs(DEFAULT_RULES_YAML);
    static ref CAPTURE_REF: Regex = Regex::new(r"\$\$|\$\{([^}]+)\}|\$([_0-9A-Za-z]+)").unwrap();
}

/// One (pattern, replacement) configuration entry.
///
/// Two pairs with identical text are the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RulePair {
    pattern: String,
    replacement: String,
}

impl RulePair {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Where an applied rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOrigin {
    Default,
    User,
}

/// The full filtering configuration: two toggles plus an ordered set of pairs.
///
/// Pairs keep their insertion order and never contain two equal entries. A
/// `RuleSet` is built whole for every configuration update and is not patched
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RuleSetRepr")]
pub struct RuleSet {
    global_enabled: bool,
    default_rules_enabled: bool,
    pairs: Vec<RulePair>,
}

#[derive(Deserialize)]
struct RuleSetRepr {
    #[serde(default)]
    global_enabled: bool,
    #[serde(default)]
    default_rules_enabled: bool,
    #[serde(default)]
    pairs: Vec<RulePair>,
}

impl From<RuleSetRepr> for RuleSet {
    fn from(repr: RuleSetRepr) -> Self {
        RuleSet::new(repr.global_enabled, repr.default_rules_enabled, repr.pairs)
    }
}

/// Form payload as submitted by a host configuration screen.
#[derive(Debug, Deserialize)]
struct FormPayload {
    #[serde(rename = "enabledGlobally", default)]
    enabled_globally: bool,
    #[serde(
        rename = "enabledDefaultRulesEnabled",
        alias = "enabledDefaultRegexp",
        default
    )]
    enabled_default_rules: bool,
    #[serde(rename = "pairs", alias = "Regexp Pairs", default)]
    pairs: Option<OneOrMany<FormEntry>>,
}

#[derive(Debug, Deserialize)]
struct FormEntry {
    #[serde(alias = "regexp")]
    pattern: Option<String>,
    replacement: Option<String>,
}

/// A field the host encodes as a bare value for one entry and a list otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct DefaultRulesDocument {
    pairs: Vec<RulePair>,
}

impl RuleSet {
    /// Builds a rule set from already-extracted pairs, collapsing duplicates.
    ///
    /// Patterns are not checked here; use [`RuleSet::validate`] or build from a
    /// form with [`RuleSet::from_form`] to reject invalid patterns.
    pub fn new(
        global_enabled: bool,
        default_rules_enabled: bool,
        pairs: impl IntoIterator<Item = RulePair>,
    ) -> Self {
        let mut seen = HashSet::new();
        let pairs = pairs
            .into_iter()
            .filter(|pair| seen.insert(pair.clone()))
            .collect();
        Self {
            global_enabled,
            default_rules_enabled,
            pairs,
        }
    }

    /// The all-off configuration used when nothing usable is stored.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Normalizes a submitted configuration form into a validated rule set.
    ///
    /// Every entry must carry both `pattern` and `replacement` and the pattern
    /// must compile. Any problem rejects the whole payload; the error lists
    /// each offending entry.
    pub fn from_form(form: &serde_json::Value) -> Result<Self, FilterError> {
        debug!("Normalizing configuration form.");
        let payload = FormPayload::deserialize(form)
            .map_err(|e| FilterError::ConfigParse(format!("malformed form payload: {}", e)))?;

        let entries = payload.pairs.map(OneOrMany::into_vec).unwrap_or_default();
        let mut pairs = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            match (entry.pattern, entry.replacement) {
                (Some(pattern), Some(replacement)) => {
                    let pair = RulePair::new(pattern, replacement);
                    match check_pair(&pair) {
                        Ok(()) => pairs.push(pair),
                        Err(reason) => errors.push(format!("entry #{}: {}", index, reason)),
                    }
                }
                (None, _) => errors.push(format!("entry #{} is missing `pattern`.", index)),
                (_, None) => errors.push(format!("entry #{} is missing `replacement`.", index)),
            }
        }

        if !errors.is_empty() {
            return Err(FilterError::ConfigParse(format!(
                "{} invalid rule entr{}:\n{}",
                errors.len(),
                if errors.len() == 1 { "y" } else { "ies" },
                errors.join("\n")
            )));
        }

        let rule_set = RuleSet::new(payload.enabled_globally, payload.enabled_default_rules, pairs);
        debug!(
            "Normalized form into {} rule pair(s), enabled={}, defaults={}.",
            rule_set.pairs.len(),
            rule_set.global_enabled,
            rule_set.default_rules_enabled
        );
        Ok(rule_set)
    }

    /// Parses a JSON form payload from text and normalizes it.
    pub fn from_form_str(json: &str) -> Result<Self, FilterError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| FilterError::ConfigParse(format!("form payload is not valid JSON: {}", e)))?;
        Self::from_form(&value)
    }

    /// Runs the eager pattern checks against every pair of this set.
    pub fn validate(&self) -> Result<(), FilterError> {
        let errors: Vec<String> = self
            .pairs
            .iter()
            .enumerate()
            .filter_map(|(index, pair)| {
                check_pair(pair)
                    .err()
                    .map(|reason| format!("entry #{}: {}", index, reason))
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FilterError::ConfigParse(errors.join("\n")))
        }
    }

    pub fn global_enabled(&self) -> bool {
        self.global_enabled
    }

    pub fn default_rules_enabled(&self) -> bool {
        self.default_rules_enabled
    }

    /// User-supplied pairs in application order.
    pub fn pairs(&self) -> &[RulePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The pairs actually applied, tagged with where they came from:
    /// built-in defaults first when enabled, followed by the user pairs, with
    /// duplicates collapsed at their first position.
    pub fn effective_pairs(&self) -> Vec<(RuleOrigin, &RulePair)> {
        let defaults: &'static [RulePair] = if self.default_rules_enabled {
            default_pairs()
        } else {
            &[]
        };
        let mut seen = HashSet::new();
        defaults
            .iter()
            .map(|pair| (RuleOrigin::Default, pair))
            .chain(self.pairs.iter().map(|pair| (RuleOrigin::User, pair)))
            .filter(|(_, pair)| seen.insert(*pair))
            .collect()
    }

    /// Stable content hash of the toggles and ordered pairs, hex encoded.
    ///
    /// Equal rule sets always share a fingerprint; it serves as the version
    /// identity for compiled-rule caching.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update([self.global_enabled as u8, self.default_rules_enabled as u8]);
        for pair in &self.pairs {
            for field in [&pair.pattern, &pair.replacement] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// The built-in default pairs shipped with the library.
pub fn default_pairs() -> &'static [RulePair] {
    &DEFAULT_PAIRS
}

fn parse_default_pairs(yaml: &str) -> Vec<RulePair> {
    match serde_yml::from_str::<DefaultRulesDocument>(yaml) {
        Ok(doc) => {
            debug!("Loaded {} default rule pairs.", doc.pairs.len());
            RuleSet::new(false, false, doc.pairs).pairs
        }
        Err(e) => {
            error!("Embedded default rules could not be parsed, continuing without them: {}", e);
            Vec::new()
        }
    }
}

/// Eager checks for one pair: non-empty, bounded, compilable, and every
/// numbered group the replacement references exists in the pattern.
fn check_pair(pair: &RulePair) -> Result<(), String> {
    let pattern = pair.pattern();
    if pattern.is_empty() {
        return Err("`pattern` is empty.".to_string());
    }
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(format!(
            "pattern length ({}) exceeds maximum allowed ({}).",
            pattern.len(),
            MAX_PATTERN_LENGTH
        ));
    }
    let regex = Regex::new(pattern)
        .map_err(|e| format!("invalid regex pattern '{}': {}", pattern, e))?;

    // `$name` is read greedily, so `$1a` names a group called `1a`.
    let group_count = regex.captures_len() - 1;
    for cap in CAPTURE_REF.captures_iter(pair.replacement()) {
        let Some(reference) = cap.get(1).or_else(|| cap.get(2)) else {
            continue;
        };
        let name = reference.as_str();
        let exists = match name.parse::<usize>() {
            Ok(group) => group <= group_count,
            Err(_) => regex.capture_names().flatten().any(|n| n == name),
        };
        if !exists {
            return Err(format!(
                "replacement references non-existent capture group '${}' in pattern '{}'.",
                name, pattern
            ));
        }
    }
    Ok(())
}
