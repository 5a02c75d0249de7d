#![deny(missing_docs)]
//! Shared logging utilities for the notes workspace.
//!
//! Every crate logs through the `notes_*` macros below so the log target
//! prefix stays uniform. The macros forward to the `log` facade re-exported
//! here, which means callers do not need their own `log` dependency.

#[doc(hidden)]
pub use log as __log;

/// Target prefix shared by all notes log records.
pub const TARGET: &str = "notes";

/// Logs a trace-level message under the notes target.
#[macro_export]
macro_rules! notes_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the notes target.
#[macro_export]
macro_rules! notes_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the notes target.
#[macro_export]
macro_rules! notes_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the notes target.
#[macro_export]
macro_rules! notes_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the notes target.
#[macro_export]
macro_rules! notes_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a terminal logger for use in tests.
///
/// Debug builds log at debug level, release builds at info. Safe to call from
/// every test: it no-ops once a global logger is installed.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}
