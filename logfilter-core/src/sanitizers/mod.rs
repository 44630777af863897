//! Rule compilation for the line engines.
//!
//! Turns a `RuleSet` into ready-to-match regular expressions and keeps a
//! fingerprint-keyed cache of the results so configuration that has not
//! changed is never compiled twice.

pub mod compiler;
