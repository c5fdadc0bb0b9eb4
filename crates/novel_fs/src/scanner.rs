//! Library scanner - recursive enumeration of chapter files

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extension of chapter files when none is configured
pub const DEFAULT_EXTENSION: &str = "txt";

/// Kind of a scanned node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One node of a scan result
///
/// `children` is only present on directories in tree mode, and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileEntry>>,
}

impl FileEntry {
    fn file(name: String, path: String) -> Self {
        Self {
            name,
            path,
            kind: EntryKind::File,
            children: None,
        }
    }

    fn directory(name: String, path: String, children: Vec<FileEntry>) -> Self {
        Self {
            name,
            path,
            kind: EntryKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Number of file entries in this subtree
    pub fn file_count(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().map(FileEntry::file_count).sum(),
            None if self.is_dir() => 0,
            None => 1,
        }
    }
}

/// Output shape of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Flattened: files only, directory structure dropped
    #[default]
    List,
    /// Nested by folder, empty folders pruned
    Tree,
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(ScanMode::List),
            "tree" => Ok(ScanMode::Tree),
            other => Err(format!("Unknown scan mode: {}", other)),
        }
    }
}

/// Options for scanning a library
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub mode: ScanMode,
    /// Lowercase extension without the leading dot
    extension: String,
    /// Emit paths with `/` separators regardless of platform
    pub forward_slashes: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: ScanMode::List,
            extension: DEFAULT_EXTENSION.to_string(),
            forward_slashes: false,
        }
    }
}

impl ScanOptions {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set the extension filter (`"txt"` and `".TXT"` are equivalent)
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_lowercase();
        self
    }

    pub fn with_forward_slashes(mut self, forward_slashes: bool) -> Self {
        self.forward_slashes = forward_slashes;
        self
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Case-insensitive suffix match on the file name
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        name.len() > self.extension.len()
            && name.ends_with(&self.extension)
            && name[..name.len() - self.extension.len()].ends_with('.')
    }

    fn display_path(&self, path: &Path) -> String {
        let shown = path.to_string_lossy();
        if self.forward_slashes {
            shown.replace('\\', "/")
        } else {
            shown.into_owned()
        }
    }
}

/// Scan `root` for matching files
///
/// Unreadable directories contribute nothing instead of failing the scan.
/// Sibling order follows the directory listing.
pub fn scan<P: AsRef<Path>>(root: P, options: &ScanOptions) -> Vec<FileEntry> {
    let root = root.as_ref();
    let ancestors = match fs::canonicalize(root) {
        Ok(canonical) => vec![canonical],
        Err(e) => {
            tracing::warn!("Cannot resolve library root {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let entries = scan_dir(root, options, &ancestors);
    tracing::debug!(
        "Scanned {} ({:?}): {} top-level entries",
        root.display(),
        options.mode,
        entries.len()
    );
    entries
}

fn scan_dir(dir: &Path, options: &ScanOptions, ancestors: &[PathBuf]) -> Vec<FileEntry> {
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!("Error reading directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let children: Vec<PathBuf> = listing
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();

    // Indexed parallel collect keeps listing order
    children
        .par_iter()
        .map(|path| scan_entry(path, options, ancestors))
        .collect::<Vec<Vec<FileEntry>>>()
        .into_iter()
        .flatten()
        .collect()
}

fn scan_entry(path: &Path, options: &ScanOptions, ancestors: &[PathBuf]) -> Vec<FileEntry> {
    // Follows symlinks
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("Skipping {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if metadata.is_dir() {
        let canonical = match fs::canonicalize(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        if ancestors.contains(&canonical) {
            tracing::warn!("Symlink cycle at {}, not descending", path.display());
            return Vec::new();
        }

        let mut chain = ancestors.to_vec();
        chain.push(canonical);
        let descendants = scan_dir(path, options, &chain);

        match options.mode {
            ScanMode::List => descendants,
            ScanMode::Tree if descendants.is_empty() => Vec::new(),
            ScanMode::Tree => vec![FileEntry::directory(
                name,
                options.display_path(path),
                descendants,
            )],
        }
    } else if metadata.is_file() && options.matches(&name) {
        vec![FileEntry::file(name, options.display_path(path))]
    } else {
        Vec::new()
    }
}
