//! NovelShelf File System Layer
//!
//! Provides the file-level building blocks of the library browser:
//! - Encoding detection and recovery for chapter files of unknown origin
//! - Text reading with line-ending normalization and preview truncation
//! - Recursive directory scanning in list or tree shape
//! - Root containment checks for network-exposed access
//! - Library watching with debounced change batches

mod encoding;
mod reader;
mod scanner;
mod guard;
mod watcher;

pub use encoding::{is_garbled, decode_text, DecodedText, TextEncoding};
pub use reader::{read_text, read_preview, normalize_line_endings, truncate_chars};
pub use scanner::{scan, EntryKind, FileEntry, ScanMode, ScanOptions, DEFAULT_EXTENSION};
pub use guard::{is_within_root, normalize_lexically, resolve_within_root};
pub use watcher::LibraryWatcher;

use std::io;
use std::path::Path;
use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {message}")]
    AccessDenied { path: String, message: String },

    #[error("Path outside library root: {0}")]
    Forbidden(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("read failed: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Watch error: {0}")]
    Watch(String),
}

impl FsError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let shown = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(shown),
            io::ErrorKind::PermissionDenied => FsError::AccessDenied {
                path: shown,
                message: err.to_string(),
            },
            _ => FsError::ReadFailed {
                path: shown,
                message: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
