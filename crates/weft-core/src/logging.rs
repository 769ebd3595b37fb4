//! Minimal leveled logging for the framework itself.
//!
//! Per-request tracing goes through [`crate::context::RequestContext::trace`];
//! this module covers the framework's own process-level messages such as
//! route registration and dispatch failures. The sink is stderr and the
//! maximum level is a process-wide atomic, so there is no logger object to
//! thread through call sites.

use std::sync::atomic::{AtomicU8, Ordering};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// The fixed-width label used in output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Error,
            1 => Self::Warn,
            3 => Self::Debug,
            _ => Self::Info,
        }
    }
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Set the most verbose level that will be emitted.
pub fn set_max_level(level: LogLevel) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// The current maximum level.
#[must_use]
pub fn max_level() -> LogLevel {
    LogLevel::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

/// Whether a message at `level` would be emitted.
#[must_use]
pub fn enabled(level: LogLevel) -> bool {
    level <= max_level()
}

/// Emit a log line at the given level.
pub fn log(level: LogLevel, target: &str, message: &str) {
    if enabled(level) {
        eprintln!("{} [{target}] {message}", level.label());
    }
}

/// Emit at error level.
pub fn error(target: &str, message: &str) {
    log(LogLevel::Error, target, message);
}

/// Emit at warn level.
pub fn warn(target: &str, message: &str) {
    log(LogLevel::Warn, target, message);
}

/// Emit at info level.
pub fn info(target: &str, message: &str) {
    log(LogLevel::Info, target, message);
}

/// Emit at debug level.
pub fn debug(target: &str, message: &str) {
    log(LogLevel::Debug, target, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_by_verbosity() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn enabled_respects_max_level() {
        let prev = max_level();
        set_max_level(LogLevel::Warn);
        assert!(enabled(LogLevel::Error));
        assert!(enabled(LogLevel::Warn));
        assert!(!enabled(LogLevel::Info));
        set_max_level(prev);
    }
}
