//! Level-tagged diagnostics on stderr.

use colored::Colorize;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

/// Log level of a message.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        })
    }
}

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppresses info and warning messages. Errors are always shown.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn format_line(level: Level, message: &str) -> String {
    let tag = format!("[{:5}]", level);
    let tag = match level {
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow().bold(),
        Level::Error => tag.red().bold(),
    };
    format!("{} {}", tag, message)
}

/// Internal logging function. Use the `info!`, `warn!`, or `error!` macros instead.
#[doc(hidden)]
pub fn log(level: Level, message: &str) {
    if level < Level::Error && QUIET.load(Ordering::Relaxed) {
        return;
    }
    eprintln!("{}", format_line(level, message));
}

/// Logs an info-level message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::log::log($crate::log::Level::Info, &format!($($arg)*));
        }
    }};
}

/// Logs a warning-level message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::log::log($crate::log::Level::Warn, &format!($($arg)*));
        }
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        if cfg!(not(test)) {
            $crate::log::log($crate::log::Level::Error, &format!($($arg)*));
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Info), "INFO");
        assert_eq!(format!("{}", Level::Warn), "WARN");
        assert_eq!(format!("{}", Level::Error), "ERROR");
    }

    #[test]
    fn test_line_carries_tag_and_message() {
        colored::control::set_override(false);
        assert_eq!(format_line(Level::Warn, "careful"), "[WARN ] careful");
        assert_eq!(format_line(Level::Error, "broken"), "[ERROR] broken");
    }
}
