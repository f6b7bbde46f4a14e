//! Discovery of the Rust sources under a schema folder.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Lists the `.rs` files under a folder, in file-name order.
///
/// `target` and dot-directories are not entered. A path to a single `.rs` file lists just
/// that file.
///
/// ```no_run
/// use router_openapi::scanner::FileScanner;
///
/// let sources = FileScanner::new("src/models").scan().unwrap();
/// println!("{} model files", sources.len());
/// ```
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Collect the Rust sources below the root.
    ///
    /// Entries that cannot be read are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FolderNotFound`] if the root does not exist.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Err(Error::FolderNotFound(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry));

        let mut sources = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.path().is_file() && is_rust_source(entry.path()) => {
                    sources.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e)
                }
            }
        }

        debug!("{} Rust sources under {}", sources.len(), self.root.display());
        Ok(sources)
    }
}

fn is_excluded(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "target"
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}
