//! Application context
//!
//! Everything the operations share lives here instead of in globals, so
//! several contexts can coexist (tests run them side by side).

use crate::config::{AppConfig, Settings, SettingsUpdate, PREVIEW_LENGTH_RANGE};
use crate::desktop::{Desktop, SystemDesktop};
use crate::error::AppError;
use novel_fs::{FileEntry, LibraryWatcher, ScanMode, ScanOptions};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, AppError>;

/// Shared application context
pub struct AppContext {
    /// Replaced as a whole, never field-mutated in place
    config: RwLock<AppConfig>,

    /// Where the configuration is persisted; `None` keeps it in memory
    config_path: Option<PathBuf>,

    /// Current library root
    library_root: RwLock<Option<PathBuf>>,

    desktop: Arc<dyn Desktop>,
}

impl AppContext {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config: RwLock::new(config),
            config_path,
            library_root: RwLock::new(None),
            desktop: Arc::new(SystemDesktop),
        }
    }

    /// Replace the desktop integration
    pub fn with_desktop(mut self, desktop: Arc<dyn Desktop>) -> Self {
        self.desktop = desktop;
        self
    }

    /// Snapshot of the whole configuration
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.config.read().settings.clone()
    }

    /// Swap in an edited copy of the config and save it
    ///
    /// Saves happen under the write lock; the file matches the in-memory record.
    fn replace_config(&self, edit: impl FnOnce(&mut AppConfig)) -> AppConfig {
        let mut guard = self.config.write();
        let mut next = guard.clone();
        edit(&mut next);
        self.persist(&next);
        *guard = next.clone();
        next
    }

    fn persist(&self, config: &AppConfig) {
        if let Some(path) = &self.config_path {
            if let Err(e) = config.save_to(path) {
                tracing::error!("Failed to save configuration: {}", e);
            }
        }
    }

    /// Merge a partial update into the settings and persist them
    pub fn update_settings(&self, update: SettingsUpdate) -> Result<Settings> {
        if let Some(length) = update.preview_length {
            if !PREVIEW_LENGTH_RANGE.contains(&length) {
                return Err(AppError::InvalidSettings(format!(
                    "previewLength must be between {} and {}, got {}",
                    PREVIEW_LENGTH_RANGE.start(),
                    PREVIEW_LENGTH_RANGE.end(),
                    length
                )));
            }
        }

        let config = self.replace_config(|config| {
            config.settings = config.settings.apply_update(update);
        });
        tracing::info!("Settings updated: {:?}", config.settings);
        Ok(config.settings)
    }

    /// Restore default settings
    pub fn reset_settings(&self) -> Settings {
        let config = self.replace_config(|config| config.settings = Settings::default());
        tracing::info!("Settings reset to defaults");
        config.settings
    }

    pub fn library_root(&self) -> Option<PathBuf> {
        self.library_root.read().clone()
    }

    /// Select `dir` as the library root and remember it
    pub fn open_library(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(AppError::NotFound(dir.display().to_string()));
        }
        let root = std::path::absolute(dir)?;

        *self.library_root.write() = Some(root.clone());
        self.replace_config(|config| config.library.last_directory = Some(root.clone()));

        tracing::info!("Library opened: {}", root.display());
        Ok(root)
    }

    /// Reopen the remembered library if it still exists
    pub fn restore_last_library(&self) -> Option<PathBuf> {
        let last = self.config.read().library.last_directory.clone()?;
        if !last.is_dir() {
            tracing::info!("Last library {} no longer exists", last.display());
            return None;
        }

        *self.library_root.write() = Some(last.clone());
        tracing::info!("Library restored: {}", last.display());
        Some(last)
    }

    /// Scan options for the configured extension
    pub fn scan_options(&self, mode: ScanMode) -> ScanOptions {
        ScanOptions::new(mode).with_extension(&self.config.read().library.extension)
    }

    /// Scan the library; empty when no library is selected
    pub fn scan(&self, mode: ScanMode) -> Vec<FileEntry> {
        self.scan_with(&self.scan_options(mode))
    }

    pub fn scan_with(&self, options: &ScanOptions) -> Vec<FileEntry> {
        match self.library_root() {
            Some(root) => novel_fs::scan(&root, options),
            None => Vec::new(),
        }
    }

    /// Decoded, normalized text of `path`, cut to the configured preview length
    pub fn preview(&self, path: &Path) -> Result<String> {
        let length = self.settings().preview_length;
        Ok(novel_fs::read_preview(path, length)?)
    }

    /// Map a requested path into the library, rejecting escapes
    pub fn resolve_in_library(&self, requested: &str) -> Result<PathBuf> {
        let root = self.library_root().ok_or(AppError::NoLibrary)?;
        Ok(novel_fs::resolve_within_root(requested, &root)?)
    }

    /// Copy the raw bytes of `path` to `dest`
    ///
    /// When `dest` is a directory the file keeps its name inside it.
    pub fn export(&self, path: &Path, dest: &Path) -> Result<u64> {
        if !path.is_file() {
            return Err(AppError::NotFound(path.display().to_string()));
        }

        let target = match (dest.is_dir(), path.file_name()) {
            (true, Some(name)) => dest.join(name),
            _ => dest.to_path_buf(),
        };

        let copied = std::fs::copy(path, &target)?;
        tracing::info!("Exported {} to {} ({} bytes)", path.display(), target.display(), copied);
        Ok(copied)
    }

    /// Open `path` in the configured editor, or the OS default handler
    pub fn open_in_editor(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(AppError::NotFound(path.display().to_string()));
        }

        let editor = self.settings().editor;
        if !editor.is_empty() {
            match self.desktop.open_with(&editor, path) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!("Failed to launch editor {}: {}, using default handler", editor, e);
                }
            }
        }

        self.desktop.open_default(path)?;
        Ok(())
    }

    /// Open the folder containing `path`
    pub fn show_in_folder(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(AppError::NotFound(path.display().to_string()));
        }

        let folder = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        self.desktop.open_default(folder)?;
        Ok(())
    }

    /// Watch the library for changes to chapter files
    pub fn watch(&self) -> Result<LibraryWatcher> {
        let root = self.library_root().ok_or(AppError::NoLibrary)?;
        let debounce = Duration::from_millis(self.config.read().watcher.debounce_ms);
        Ok(LibraryWatcher::new(&root, self.scan_options(ScanMode::List), debounce)?)
    }
}
