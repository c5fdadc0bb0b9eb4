//! Debug-build watchdog for `parking_lot` deadlocks

use std::fmt::Write as _;
use std::thread;
use std::time::Duration;

const CHECK_INTERVAL: Duration = Duration::from_secs(10);

pub(crate) fn spawn_watchdog() {
    let spawned = thread::Builder::new()
        .name("novel-deadlock-watchdog".into())
        .spawn(|| loop {
            thread::sleep(CHECK_INTERVAL);
            let cycles = parking_lot::deadlock::check_deadlock();
            if cycles.is_empty() {
                continue;
            }
            let threads: Vec<Vec<(String, String)>> = cycles
                .iter()
                .map(|cycle| {
                    cycle
                        .iter()
                        .map(|t| (format!("{:?}", t.thread_id()), format!("{:?}", t.backtrace())))
                        .collect()
                })
                .collect();
            tracing::error!("{}", describe(&threads));
        });

    if let Err(e) = spawned {
        tracing::warn!("Deadlock watchdog not started: {}", e);
    }
}

/// One log entry for all cycles: thread id and backtrace per blocked thread
fn describe(cycles: &[Vec<(String, String)>]) -> String {
    let mut out = format!("{} deadlock cycle(s) detected", cycles.len());
    for (i, cycle) in cycles.iter().enumerate() {
        let _ = write!(out, "\ncycle #{}: {} thread(s)", i, cycle.len());
        for (id, backtrace) in cycle {
            let _ = write!(out, "\n  thread {}\n{}", id, backtrace);
        }
    }
    out
}
