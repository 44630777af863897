//! Formatting of status messages written to stderr.
//!
//! Messages are colored only when the destination is a terminal.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warn,
    Error,
}

/// Writes one status message line to `writer`.
pub fn print_message<W: Write>(
    writer: &mut W,
    kind: MessageKind,
    message: &str,
    enable_colors: bool,
) -> io::Result<()> {
    if !enable_colors {
        return writeln!(writer, "{}", message);
    }
    match kind {
        MessageKind::Info => writeln!(writer, "{}", message.cyan()),
        MessageKind::Success => writeln!(writer, "{}", message.green()),
        MessageKind::Warn => writeln!(writer, "{}", message.yellow()),
        MessageKind::Error => writeln!(writer, "{}", message.red().bold()),
    }
}

fn to_stderr(kind: MessageKind, message: &str) {
    let stderr = io::stderr();
    let enable_colors = stderr.is_terminal();
    let _ = print_message(&mut stderr.lock(), kind, message, enable_colors);
}

/// Helper for printing info messages to stderr.
pub fn info_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Info, message.as_ref());
}

/// Helper for printing success messages to stderr.
pub fn success_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Success, message.as_ref());
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Warn, message.as_ref());
}

/// Helper for printing error messages to stderr.
pub fn error_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Error, message.as_ref());
}
