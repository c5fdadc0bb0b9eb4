//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("read failed: {0}")]
    ReadFailure(String),

    #[error("No library directory selected")]
    NoLibrary,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Fatal Errors (application termination) =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Config(_) | AppError::Init(_))
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// The file vanished under us; the listing is stale
    pub fn should_rescan(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(path) => format!("read failed: file not found: {}", path),
            AppError::Forbidden(path) => format!("Access denied: {}", path),
            AppError::Io(e) => format!("read failed: {}", e),
            _ => self.to_string(),
        }
    }
}

impl From<novel_fs::FsError> for AppError {
    fn from(e: novel_fs::FsError) -> Self {
        match e {
            novel_fs::FsError::NotFound(p) => AppError::NotFound(p),
            novel_fs::FsError::Forbidden(p) | novel_fs::FsError::InvalidPath(p) => {
                AppError::Forbidden(p)
            }
            novel_fs::FsError::AccessDenied { message, .. }
            | novel_fs::FsError::ReadFailed { message, .. } => AppError::ReadFailure(message),
            other => AppError::ReadFailure(other.to_string()),
        }
    }
}
