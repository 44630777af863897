// logfilter-core/src/stream.rs
//! Lazy filtering of log streams.
//!
//! `StreamFilter` wraps any iterator of lines and yields the filtered lines
//! one-to-one, in order, only as they are pulled. Log streams may be large or
//! open-ended (live tailing), so nothing is buffered beyond the current line.
//! A consumer that stops pulling simply drops the adapter.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::config::RuleSet;
use crate::engine::FilterEngine;
use crate::engines::build_engine;
use crate::sanitizers::compiler::PatternCompiler;

/// Iterator adapter applying a `FilterEngine` to every line of `I`.
///
/// Each line is filtered on its own, so cloning a `StreamFilter` over a
/// cloneable input restarts the stream and reproduces the same output.
#[derive(Clone)]
pub struct StreamFilter<I> {
    lines: I,
    engine: Arc<dyn FilterEngine>,
}

impl<I> StreamFilter<I>
where
    I: Iterator,
    I::Item: Into<String>,
{
    /// Filters `lines` with `rule_set`, compiling through the shared cache.
    pub fn new<L>(rule_set: &RuleSet, lines: L) -> Self
    where
        L: IntoIterator<IntoIter = I>,
    {
        Self::with_compiler(rule_set, PatternCompiler::global(), lines)
    }

    pub fn with_compiler<L>(rule_set: &RuleSet, compiler: &PatternCompiler, lines: L) -> Self
    where
        L: IntoIterator<IntoIter = I>,
    {
        Self::with_engine(build_engine(rule_set.clone(), compiler), lines)
    }

    /// Filters `lines` with an engine that is already built, e.g. one taken
    /// from an `ActiveConfig` snapshot and shared across several streams.
    pub fn with_engine<L>(engine: Arc<dyn FilterEngine>, lines: L) -> Self
    where
        L: IntoIterator<IntoIter = I>,
    {
        Self {
            lines: lines.into_iter(),
            engine,
        }
    }

    pub fn engine(&self) -> &Arc<dyn FilterEngine> {
        &self.engine
    }
}

impl<I> Iterator for StreamFilter<I>
where
    I: Iterator,
    I::Item: Into<String>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let line: String = self.lines.next()?.into();
        if !self.engine.is_active() {
            return Some(line);
        }
        let filtered = match self.engine.filter_line(&line) {
            Cow::Owned(text) => Some(text),
            Cow::Borrowed(_) => None,
        };
        Some(filtered.unwrap_or(line))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

impl<I> fmt::Debug for StreamFilter<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamFilter")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Filters a sequence of lines with `rule_set`.
///
/// This is the main entry point for log-processing pipelines. When
/// `rule_set` is globally disabled the lines pass through untouched and no
/// pattern is compiled.
pub fn filter_stream<L>(rule_set: &RuleSet, lines: L) -> StreamFilter<L::IntoIter>
where
    L: IntoIterator,
    L::Item: Into<String>,
{
    StreamFilter::new(rule_set, lines)
}

/// Adds `.filter_lines(engine)` to every iterator of lines.
pub trait FilterLinesExt: Iterator + Sized {
    fn filter_lines(self, engine: Arc<dyn FilterEngine>) -> StreamFilter<Self>
    where
        Self::Item: Into<String>,
    {
        StreamFilter::with_engine(engine, self)
    }
}

impl<I: Iterator> FilterLinesExt for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulePair;

    fn enabled(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::new(true, false, pairs.iter().map(|(p, r)| RulePair::new(*p, *r)))
    }

    #[test]
    fn test_stream_preserves_order_one_to_one() {
        let set = enabled(&[(r"\d+", "N")]);
        let out: Vec<String> = filter_stream(&set, ["a1", "b", "c22", ""]).collect();
        assert_eq!(out, ["aN", "b", "cN", ""]);
    }

    #[test]
    fn test_disabled_stream_passes_through_without_compiling() {
        let compiler = PatternCompiler::new();
        let set = RuleSet::new(false, true, vec![RulePair::new("secret", "****")]);
        let input = vec!["secret one".to_string(), "secret two".to_string()];
        let out: Vec<String> = StreamFilter::with_compiler(&set, &compiler, input.clone()).collect();
        assert_eq!(out, input);
        assert_eq!(compiler.compilations(), 0);
    }

    #[test]
    fn test_stream_is_lazy_over_unbounded_input() {
        let set = enabled(&[("tick", "tock")]);
        let endless = (0u64..).map(|i| format!("tick {}", i));
        let first: Vec<String> = filter_stream(&set, endless).take(3).collect();
        assert_eq!(first, ["tock 0", "tock 1", "tock 2"]);
    }

    #[test]
    fn test_restarting_reproduces_output() {
        let set = enabled(&[("A", "B"), ("B", "C")]);
        let input = vec!["A", "AB", "xyz"];
        let stream = filter_stream(&set, input.iter().copied());
        let first: Vec<String> = stream.clone().collect();
        let second: Vec<String> = stream.collect();
        assert_eq!(first, ["C", "CC", "xyz"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_lines_extension_shares_engine() {
        let engine = build_engine(enabled(&[("x", "y")]), &PatternCompiler::new());
        let a: Vec<String> = ["x1"].into_iter().filter_lines(Arc::clone(&engine)).collect();
        let b: Vec<String> = ["2x"].into_iter().filter_lines(engine).collect();
        assert_eq!(a, ["y1"]);
        assert_eq!(b, ["2y"]);
    }
}
