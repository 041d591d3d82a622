//! Output functions for consistent CLI formatting
//!
//! Everything here writes to stderr.

use console::style;

/// Display a success step with detail
pub fn step_ok_detail(message: &str, detail: &str) {
    eprintln!("{} {} ({})", style("[OK]").green(), message, style(detail).dim());
}

/// Display a warning step with hint
pub fn step_warn_hint(message: &str, hint: &str) {
    eprintln!("{} {} - {}", style("[WARN]").yellow(), message, style(hint).dim());
}

/// Display an info step
pub fn step_info(message: &str) {
    eprintln!("{} {}", style("[INFO]").cyan(), message);
}
