//! Styled terminal output for `protohelp`.
//!
//! Status lines go to stderr so that `plan` and `case` output on stdout can
//! be piped. `anstream` strips the styling when the stream is not a terminal.

mod styles;

use std::fmt::Display;
use std::io::Write;

pub(crate) use styles::clap_styles;

use styles::{DIM, ERROR, HEADER, SUCCESS, WARNING};

/// Print a success message (green checkmark prefix).
pub(crate) fn success(msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "{SUCCESS}✓{SUCCESS:#} {msg}").ok();
}

/// Print an error message (red X prefix).
pub(crate) fn error(msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "{ERROR}✗ {msg}{ERROR:#}").ok();
}

/// Print a warning message (yellow exclamation prefix).
pub(crate) fn warning(msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "{WARNING}! {msg}{WARNING:#}").ok();
}

/// Print a section header (bold).
pub(crate) fn header(msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "{HEADER}{msg}{HEADER:#}").ok();
}

/// Print a numbered list entry.
pub(crate) fn numbered(index: usize, msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "  {DIM}{index}.{DIM:#} {msg}").ok();
}

/// Print dimmed/muted text.
pub(crate) fn dim(msg: impl Display) {
    let mut out = anstream::stderr().lock();
    writeln!(out, "{DIM}{msg}{DIM:#}").ok();
}

/// Print plain text to stdout (command results).
pub(crate) fn plain(msg: impl Display) {
    let mut out = anstream::stdout().lock();
    writeln!(out, "{msg}").ok();
}
