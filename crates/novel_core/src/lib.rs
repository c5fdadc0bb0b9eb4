//! NovelShelf Core Domain Logic
//!
//! This crate contains:
//! - Application context (library root, settings, desktop integration)
//! - Configuration and settings persistence
//! - Error types

pub mod state;
pub mod config;
pub mod desktop;
pub mod error;

pub use state::AppContext;
pub use config::{
    AppConfig, Settings, SettingsUpdate, LibraryConfig, ServerConfig, WatcherConfig,
    PREVIEW_LENGTH_RANGE,
};
pub use desktop::{Desktop, SystemDesktop};
pub use error::AppError;

pub use novel_fs::{EntryKind, FileEntry, ScanMode, ScanOptions};
