//! `config` command: show, replace, and list defaults of the filter configuration.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use logfilter_core::{default_pairs, ActiveConfig, ConfigGateway, RulePair, RuleSet};

use crate::ui::output_format::{success_msg, warn_msg};

#[derive(Debug, Serialize)]
struct ConfigReport<'a> {
    store: String,
    global_enabled: bool,
    default_rules_enabled: bool,
    fingerprint: String,
    pairs: &'a [RulePair],
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Writes a human-readable (or JSON) description of `rule_set`.
pub fn write_config_report<W: Write>(
    writer: &mut W,
    store: &str,
    rule_set: &RuleSet,
    json: bool,
) -> Result<()> {
    let report = ConfigReport {
        store: store.to_string(),
        global_enabled: rule_set.global_enabled(),
        default_rules_enabled: rule_set.default_rules_enabled(),
        fingerprint: rule_set.fingerprint(),
        pairs: rule_set.pairs(),
    };

    if json {
        serde_json::to_writer_pretty(&mut *writer, &report).context("Failed to serialize configuration")?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer, "Store: {}", report.store)?;
    writeln!(writer, "Filtering enabled: {}", yes_no(report.global_enabled))?;
    writeln!(writer, "Default rules enabled: {}", yes_no(report.default_rules_enabled))?;
    writeln!(writer, "Fingerprint: {}", report.fingerprint)?;
    writeln!(writer, "Pairs ({}):", report.pairs.len())?;
    for (i, pair) in report.pairs.iter().enumerate() {
        writeln!(writer, "  {}. {} => {}", i + 1, pair.pattern(), pair.replacement())?;
    }
    Ok(())
}

pub fn run_show(gateway: &dyn ConfigGateway, store: &str, json: bool) -> Result<()> {
    let rule_set = gateway.load().context("Failed to load the stored configuration")?;
    let stdout = io::stdout();
    write_config_report(&mut stdout.lock(), store, &rule_set, json)
}

/// Reads a form payload from `source` (`-` means stdin) and installs it.
pub fn run_set(gateway: Box<dyn ConfigGateway>, source: &Path, quiet: bool) -> Result<()> {
    let text = if source == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("Failed to read form payload from stdin")?;
        buf
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("Failed to read form payload {}", source.display()))?
    };
    let form: serde_json::Value = serde_json::from_str(&text).context("Form payload is not valid JSON")?;

    let active = ActiveConfig::load(gateway);
    let snapshot = active
        .apply_form(&form)
        .context("Configuration update rejected; the previous configuration is still active")?;

    info!("Installed configuration {}.", snapshot.rule_set.fingerprint());
    if !quiet {
        success_msg(format!(
            "Configuration saved: {} pair(s), filtering {}, default rules {}.",
            snapshot.rule_set.len(),
            if snapshot.rule_set.global_enabled() { "enabled" } else { "disabled" },
            if snapshot.rule_set.default_rules_enabled() { "enabled" } else { "disabled" },
        ));
        if !snapshot.engine.is_active() {
            warn_msg("No rules are active; filtered output will be passed through unchanged.");
        }
    }
    Ok(())
}

pub fn run_defaults() -> Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    writeln!(writer, "Built-in default rules (applied before user rules):")?;
    for (i, pair) in default_pairs().iter().enumerate() {
        writeln!(writer, "  {}. {} => {}", i + 1, pair.pattern(), pair.replacement())?;
    }
    Ok(())
}
