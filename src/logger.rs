//! Structured logging system with visual formatting.
//!
//! This module provides the logging macros used throughout duskshift. It
//! produces structured output with Unicode box drawing characters so that
//! related messages (a mode transition, a location refresh, a scheduler
//! start) read as one visual block.
//!
//! The logger supports runtime enable/disable for quiet operation during
//! automated processes or testing, and a separate debug toggle for the
//! `log_debug!` macro.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

// AtomicBool rather than thread_local so scheduler threads observe toggles
static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Main logging interface providing structured output formatting.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`**: initiates a new conceptual block of log
///   information (mode transitions, scheduler lifecycle, service queries).
///   Prepends an empty pipe `┃` for spacing, then prints `┣ message`.
/// - **`log_decorated!`**: a message that continues an existing block, or a
///   simple single-line status that still fits the pipe structure.
///   Prints `┣ message`.
/// - **`log_indented!`**: nested detail belonging to a parent message
///   (trigger times, coordinates, provider names). Prints `┃   message`.
/// - **`log_pipe!`**: a single empty prefixed line (`┃`) for vertical
///   spacing, typically before `log_warning!`/`log_error!`.
/// - **`log_version!`** / **`log_end!`**: startup header and final
///   termination marker.
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`**: semantic
///   level-prefixed messages. `log_debug!` only prints when debug output is
///   enabled via [`Log::set_debug`].
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    ///
    /// Useful for quiet operation during automated processes or testing
    /// where log output would interfere with results.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable debug-level output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if debug-level output is enabled.
    pub fn is_debug_enabled() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }
}

/// Write formatted output to stdout.
///
/// Used by all logging macros. Flushes immediately so output from scheduler
/// threads interleaves in real order.
pub fn write_output(formatted: &str) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(formatted.as_bytes());
    let _ = handle.flush();
}

/// Log a message that continues the current block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output(&format!("┣ {}\n", $expr));
        }
    }};
}

/// Log nested detail under the current block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃   {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output(&format!("┃   {}\n", $expr));
        }
    }};
}

/// Log a single empty prefixed line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output("┃\n");
        }
    }};
}

/// Log a block start message, initiating a new conceptual block.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃\n┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output(&format!("┃\n┣ {}\n", $expr));
        }
    }};
}

/// Log the application startup header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("┏ duskshift v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output("╹\n");
        }
    }};
}

/// Log a warning message with pipe prefix and yellow-colored level tag.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[33mWARNING\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output(&format!("┣[\x1b[33mWARNING\x1b[0m] {}\n", $expr));
        }
    }};
}

/// Log an error message with pipe prefix and red-colored level tag.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[31mERROR\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output(&format!("┣[\x1b[31mERROR\x1b[0m] {}\n", $expr));
        }
    }};
}

/// Log an informational message with pipe prefix and level tag.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[36mINFO\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output(&format!("┣[\x1b[36mINFO\x1b[0m] {}\n", $expr));
        }
    }};
}

/// Log a debug message. Only prints when debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() && Log::is_debug_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[35mDEBUG\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() && Log::is_debug_enabled() {
            $crate::logger::write_output(&format!("┣[\x1b[35mDEBUG\x1b[0m] {}\n", $expr));
        }
    }};
}
