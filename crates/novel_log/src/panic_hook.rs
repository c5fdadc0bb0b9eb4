//! Crash reports for panics
//!
//! A report names the build, the command line and the library that was
//! open, then the panic itself with a backtrace.

use backtrace::Backtrace;
use chrono::Local;
use parking_lot::Mutex;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

/// Library root shown in crash reports
static CRASH_LIBRARY: Mutex<Option<PathBuf>> = parking_lot::const_mutex(None);

/// Record the library root for later crash reports
pub fn set_crash_library(root: Option<&Path>) {
    *CRASH_LIBRARY.lock() = root.map(Path::to_path_buf);
}

/// Install the crash-reporting panic hook
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let report = CrashReport::capture(info);
        report.emit();
    }));
    tracing::debug!("Panic hook initialized");
}

struct CrashReport {
    timestamp: String,
    command_line: String,
    library: Option<PathBuf>,
    thread: String,
    location: String,
    message: String,
    backtrace: String,
}

impl CrashReport {
    fn capture(info: &PanicHookInfo) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_string());

        Self {
            timestamp: Local::now().to_rfc3339(),
            command_line: std::env::args().collect::<Vec<_>>().join(" "),
            // try_lock: the panicking thread may hold it
            library: CRASH_LIBRARY.try_lock().and_then(|root| root.clone()),
            thread: std::thread::current().name().unwrap_or("<unnamed>").to_string(),
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "<unknown>".to_string()),
            message,
            backtrace: format!("{:?}", Backtrace::new()),
        }
    }

    fn render(&self) -> String {
        let library = self
            .library
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());

        format!(
            "=== novel-shelf {} crashed ===\n\
             Time: {}\n\
             Command: {}\n\
             Library: {}\n\
             Thread: {}\n\
             At: {}\n\
             Panic: {}\n\n\
             Backtrace:\n{}",
            env!("CARGO_PKG_VERSION"),
            self.timestamp,
            self.command_line,
            library,
            self.thread,
            self.location,
            self.message,
            self.backtrace
        )
    }

    fn emit(&self) {
        let report = self.render();
        eprintln!("{}", report);
        tracing::error!(
            thread = %self.thread,
            at = %self.location,
            "novel-shelf panicked: {}",
            self.message
        );

        let dump_path = std::env::temp_dir().join(format!(
            "novel_shelf_crash_{}.txt",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        match std::fs::write(&dump_path, &report) {
            Ok(()) => eprintln!("Crash report written to {}", dump_path.display()),
            Err(e) => eprintln!("Failed to write crash report: {}", e),
        }
    }
}
