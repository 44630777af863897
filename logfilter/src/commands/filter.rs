//! `filter` command: runs files or stdin through the configured rules.

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use logfilter_core::{
    build_engine, ActiveConfig, ConfigGateway, FilterEngine, FilterLinesExt, PatternCompiler,
    RuleSet,
};

use crate::cli::FilterCommand;
use crate::ui::output_format::{info_msg, success_msg};

/// Options for [`run_filter`], decoupled from clap.
pub struct FilterOptions {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub form: Option<PathBuf>,
    pub line_buffered: bool,
    pub quiet: bool,
}

impl FilterOptions {
    pub fn from_command(cmd: FilterCommand, quiet: bool) -> Self {
        Self {
            inputs: cmd.inputs,
            output: cmd.output,
            output_dir: cmd.output_dir,
            form: cmd.form,
            line_buffered: cmd.line_buffered,
            quiet,
        }
    }
}

/// Streams `reader` through `engine` into `writer`, one line at a time.
///
/// Returns the number of lines written. Line terminators are normalized to `\n`.
pub fn filter_reader<R: BufRead, W: Write>(
    engine: Arc<dyn FilterEngine>,
    reader: R,
    writer: &mut W,
    line_buffered: bool,
) -> Result<usize> {
    let mut read_error = None;
    let lines = reader.lines().map_while(|line| match line {
        Ok(line) => Some(line),
        Err(e) => {
            read_error = Some(e);
            None
        }
    });

    let mut count = 0;
    for filtered in lines.filter_lines(engine) {
        writeln!(writer, "{}", filtered).context("Failed to write filtered output")?;
        if line_buffered {
            writer.flush().context("Failed to flush filtered output")?;
        }
        count += 1;
    }
    if let Some(e) = read_error {
        return Err(e).context("Failed to read input");
    }
    writer.flush().context("Failed to flush filtered output")?;
    Ok(count)
}

/// The engine for this run: from `--form` when given, otherwise from the
/// stored configuration.
fn resolve_engine(form: Option<&Path>, gateway: Box<dyn ConfigGateway>) -> Result<Arc<dyn FilterEngine>> {
    match form {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read form payload {}", path.display()))?;
            let rule_set = RuleSet::from_form_str(&text)
                .with_context(|| format!("Rejected form payload {}", path.display()))?;
            Ok(build_engine(rule_set, PatternCompiler::global()))
        }
        None => Ok(Arc::clone(&ActiveConfig::load(gateway).snapshot().engine)),
    }
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open input file {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// True when `a` and `b` name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Maps every input to its target inside `dir`, refusing to overwrite an
/// input or to send two inputs to the same target.
fn plan_dir_targets(inputs: &[PathBuf], dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input
            .file_name()
            .ok_or_else(|| anyhow!("Input path {} has no file name", input.display()))?;
        if !seen.insert(name.to_os_string()) {
            return Err(anyhow!(
                "Two inputs would both be written to {}",
                dir.join(name).display()
            ));
        }
        let target = dir.join(name);
        if is_same_file(input, &target) {
            return Err(anyhow!(
                "Refusing to overwrite input {} with its own filtered output",
                input.display()
            ));
        }
        plan.push((input.clone(), target));
    }
    Ok(plan)
}

fn filter_file_into(engine: Arc<dyn FilterEngine>, input: &Path, target: &Path) -> Result<usize> {
    let reader = open_input(input)?;
    let out = File::create(target)
        .with_context(|| format!("Failed to create output file {}", target.display()))?;
    let mut writer = BufWriter::new(out);
    filter_reader(engine, reader, &mut writer, false)
        .with_context(|| format!("Failed to filter {}", input.display()))
}

/// The main operation runner for the `filter` command.
pub async fn run_filter(opts: FilterOptions, gateway: Box<dyn ConfigGateway>) -> Result<()> {
    info!("Starting filter operation.");
    let engine = resolve_engine(opts.form.as_deref(), gateway)?;
    if !engine.is_active() && !opts.quiet {
        info_msg("Filtering is disabled or has no rules; output is passed through unchanged.");
    }

    if let Some(dir) = &opts.output_dir {
        if opts.inputs.is_empty() {
            return Err(anyhow!("--output-dir needs at least one input file"));
        }
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let plan = plan_dir_targets(&opts.inputs, dir)?;

        let mut tasks = JoinSet::new();
        for (input, target) in plan {
            let engine = Arc::clone(&engine);
            tasks.spawn_blocking(move || {
                filter_file_into(engine, &input, &target).map(|count| (target, count))
            });
        }
        while let Some(joined) = tasks.join_next().await {
            let (target, count) = joined.context("Filter task panicked")??;
            debug!("Wrote {} line(s) to {}", count, target.display());
            if !opts.quiet {
                success_msg(format!("Filtered {} line(s) into {}", count, target.display()));
            }
        }
        return Ok(());
    }

    let mut writer: Box<dyn Write> = match &opts.output {
        Some(path) => {
            if let Some(input) = opts.inputs.iter().find(|input| is_same_file(input, path)) {
                return Err(anyhow!(
                    "Refusing to overwrite input {} with its own filtered output",
                    input.display()
                ));
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    // stdout is always flushed per line so piped consumers see output live.
    let line_buffered = opts.line_buffered || opts.output.is_none();
    let mut total = 0;
    if opts.inputs.is_empty() {
        total += filter_reader(Arc::clone(&engine), io::stdin().lock(), &mut writer, line_buffered)?;
    } else {
        for input in &opts.inputs {
            total += filter_reader(Arc::clone(&engine), open_input(input)?, &mut writer, line_buffered)
                .with_context(|| format!("Failed to filter {}", input.display()))?;
        }
    }

    debug!("Filter operation wrote {} line(s).", total);
    if let Some(path) = &opts.output {
        if !opts.quiet {
            success_msg(format!("Filtered {} line(s) into {}", total, path.display()));
        }
    }
    info!("Filter operation completed.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfilter_core::RulePair;
    use std::io::Cursor;
    use test_log::test;

    fn engine(pairs: &[(&str, &str)]) -> Arc<dyn FilterEngine> {
        let set = RuleSet::new(true, false, pairs.iter().map(|(p, r)| RulePair::new(*p, *r)));
        build_engine(set, &PatternCompiler::new())
    }

    #[test]
    fn test_filter_reader_rewrites_each_line() {
        let input = Cursor::new("user=alice password=x1\r\nplain\nlast password=y2");
        let mut out = Vec::new();
        let count = filter_reader(engine(&[(r"password=\S+", "password=****")]), input, &mut out, true).unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "user=alice password=****\nplain\nlast password=****\n"
        );
    }

    #[test]
    fn test_dir_target_equal_to_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("x.log");
        fs::write(&input, "password=1\nkeep me\n").unwrap();

        let err = plan_dir_targets(&[input.clone()], dir.path()).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite input"));
        assert_eq!(fs::read_to_string(&input).unwrap(), "password=1\nkeep me\n");
    }

    #[test]
    fn test_dir_targets_must_be_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = [dir.path().join("a").join("app.log"), dir.path().join("b").join("app.log")];
        let err = plan_dir_targets(&inputs, &dir.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("Two inputs would both be written to"));
    }

    #[test]
    fn test_dir_targets_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = [PathBuf::from("logs/one.log"), PathBuf::from("two.log")];
        let plan = plan_dir_targets(&inputs, dir.path()).unwrap();
        assert_eq!(plan[0], (inputs[0].clone(), dir.path().join("one.log")));
        assert_eq!(plan[1], (inputs[1].clone(), dir.path().join("two.log")));
    }

    #[test]
    fn test_filter_reader_reports_invalid_utf8() {
        let input = Cursor::new(b"fine\n\xff\xfe broken\n".to_vec());
        let mut out = Vec::new();
        let err = filter_reader(engine(&[]), input, &mut out, false).unwrap_err();
        assert!(err.to_string().contains("Failed to read input"));
        assert_eq!(out, b"fine\n");
    }
}
