//! Desktop integration: launching editors and the OS file handler

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Hands files over to other programs
pub trait Desktop: Send + Sync {
    /// Launch `program` with `path` as its only argument, without waiting
    fn open_with(&self, program: &str, path: &Path) -> io::Result<()>;

    /// Open `path` with the OS default handler
    fn open_default(&self, path: &Path) -> io::Result<()>;
}

/// The real desktop
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

impl Desktop for SystemDesktop {
    fn open_with(&self, program: &str, path: &Path) -> io::Result<()> {
        Command::new(program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        tracing::info!("Opened with {}: {}", program, path.display());
        Ok(())
    }

    fn open_default(&self, path: &Path) -> io::Result<()> {
        open::that(path)?;
        tracing::info!("Opened externally: {}", path.display());
        Ok(())
    }
}
