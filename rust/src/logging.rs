//! Logging macros with verbosity level control.
//!
//! Zero-cost when disabled (verbosity=0). Levels:
//! - 0: SILENT (only errors)
//! - 1: CHANGES (graph built, total cost changed)
//! - 2: CHECKS (dropped edges, ignored overrides)
//! - 3: DEBUG (every inferred edge, per-node path values)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Whether a message at `level` is printed under `verbosity`.
#[inline]
pub fn enabled(verbosity: u8, level: u8) -> bool {
    verbosity >= level
}

/// Log at CHANGES level (verbosity >= 1).
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHANGES) {
            eprintln!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHECKS) {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_DEBUG) {
            eprintln!($($arg)*);
        }
    };
}
