//! NovelShelf logging and crash reporting
//!
//! Console and rolling JSON file logs, old-log cleanup, crash reports for
//! panics and, in debug builds, a lock deadlock watchdog.

#[cfg(debug_assertions)]
mod deadlock;
mod logging;
mod panic_hook;

pub use logging::{cleanup_logs_in, cleanup_old_logs, init_logging, LogGuard};
pub use panic_hook::{init_panic_hook, set_crash_library};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Directory holding the rolling log files
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "NovelShelf", "NovelShelf")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Set up logging, the panic hook and (debug builds) the deadlock watchdog
///
/// Hold the returned guard until exit; dropping it flushes the log file.
pub fn init() -> anyhow::Result<LogGuard> {
    let guard = init_logging()?;
    init_panic_hook();

    #[cfg(debug_assertions)]
    deadlock::spawn_watchdog();

    Ok(guard)
}
