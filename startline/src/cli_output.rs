//! Terminal output helpers shared by the `startline` binary.

use colored::*;

pub const ICON_SUCCESS: &str = "\u{2713}"; // ✓
pub const ICON_ERROR: &str = "\u{2717}"; // ✗
pub const ICON_WARN: &str = "\u{26a0}"; // ⚠

/// Bold cyan section header
pub fn header(msg: &str) {
    println!("{}", msg.cyan().bold());
}

/// Indented `key: value` line
pub fn field(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Worker line that finished: ✓ message
pub fn success(msg: &str) {
    println!("{} {}", ICON_SUCCESS.green(), msg);
}

/// Worker line that failed: ✗ message
pub fn failure(msg: &str) {
    println!("{} {}", ICON_ERROR.red(), msg);
}

/// Worker line that never ran: ⚠ message
pub fn warn(msg: &str) {
    println!("{} {}", ICON_WARN.yellow(), msg);
}

/// Fatal error on stderr, in the same shape as clap's own errors.
pub fn error(err: &dyn std::fmt::Display) {
    eprintln!("{} {}", "Error:".red().bold(), err);
}
