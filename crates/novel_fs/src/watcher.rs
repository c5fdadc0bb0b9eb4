//! Library watcher with notify-debouncer-mini
//!
//! Raw change events are debounced into batches; each batch is one quiet
//! period and should trigger at most one rescan.

use crate::{FsError, Result, ScanOptions};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Recursive watcher over a library root
pub struct LibraryWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    event_rx: Receiver<DebounceEventResult>,
    root: PathBuf,
    filter: ScanOptions,
}

impl LibraryWatcher {
    /// Start watching `root`, reporting changes to files accepted by `filter`
    pub fn new(root: &Path, filter: ScanOptions, debounce: Duration) -> Result<Self> {
        let (tx, rx) = channel();

        let mut debouncer =
            new_debouncer(debounce, tx).map_err(|e| FsError::Watch(e.to_string()))?;
        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| FsError::Watch(e.to_string()))?;

        tracing::info!("Watching: {}", root.display());

        Ok(Self {
            debouncer,
            event_rx: rx,
            root: root.to_path_buf(),
            filter,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drain pending batches without blocking
    pub fn poll_changes(&self) -> Vec<PathBuf> {
        let mut changed = BTreeSet::new();
        while let Ok(result) = self.event_rx.try_recv() {
            self.collect(result, &mut changed);
        }
        changed.into_iter().collect()
    }

    /// Block until a batch with relevant changes arrives or `timeout` passes
    ///
    /// `Ok(None)` means the timeout passed quietly. A watcher that has shut
    /// down yields `FsError::Watch`.
    pub fn wait_for_change(&self, timeout: Duration) -> Result<Option<Vec<PathBuf>>> {
        wait_for_batch(&self.event_rx, timeout, |path| self.is_relevant(path)).map_err(|e| {
            tracing::warn!("Watcher for {} stopped: {}", self.root.display(), e);
            e
        })
    }

    fn collect(&self, result: DebounceEventResult, changed: &mut BTreeSet<PathBuf>) {
        collect_batch(result, |path| self.is_relevant(path), changed);
    }

    /// Matching chapter files, or anything that disappeared (could be a folder)
    fn is_relevant(&self, path: &Path) -> bool {
        let matches = path
            .file_name()
            .map(|n| self.filter.matches(&n.to_string_lossy()))
            .unwrap_or(false);
        matches || !path.exists()
    }
}

fn wait_for_batch(
    rx: &Receiver<DebounceEventResult>,
    timeout: Duration,
    is_relevant: impl Fn(&Path) -> bool,
) -> Result<Option<Vec<PathBuf>>> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(result) => {
                let mut changed = BTreeSet::new();
                collect_batch(result, &is_relevant, &mut changed);
                if !changed.is_empty() {
                    return Ok(Some(changed.into_iter().collect()));
                }
            }
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(FsError::Watch("event channel closed".to_string()));
            }
        }
    }
}

fn collect_batch(
    result: DebounceEventResult,
    is_relevant: impl Fn(&Path) -> bool,
    changed: &mut BTreeSet<PathBuf>,
) {
    match result {
        Ok(events) => {
            for event in events {
                if matches!(event.kind, DebouncedEventKind::Any) && is_relevant(&event.path) {
                    changed.insert(event.path);
                }
            }
        }
        Err(e) => {
            tracing::warn!("Watcher error: {:?}", e);
        }
    }
}

impl Drop for LibraryWatcher {
    fn drop(&mut self) {
        let _ = self.debouncer.watcher().unwatch(&self.root);
    }
}
