//! Parsing of Rust sources into `syn` syntax trees.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// A Rust source file and its syntax tree
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub syntax_tree: syn::File,
}

/// Turns source files into [`ParsedFile`]s with `syn`.
///
/// ```no_run
/// use router_openapi::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/models/entity.rs")).unwrap();
/// assert!(!parsed.syntax_tree.items.is_empty());
/// ```
pub struct AstParser;

impl AstParser {
    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::IoError`] if the file cannot be read, [`Error::ParseError`] if it is not valid
    /// Rust.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        let content = fs::read_to_string(path)?;
        Self::parse_source(path, &content)
    }

    /// Parse `content` as the contents of `path`
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        match syn::parse_file(content) {
            Ok(syntax_tree) => {
                debug!("{}: {} top-level items", path.display(), syntax_tree.items.len());
                Ok(ParsedFile {
                    path: path.to_path_buf(),
                    syntax_tree,
                })
            }
            Err(e) => Err(Error::ParseError {
                file: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Parse every file of a folder, stopping at the first failure
    pub fn parse_all(paths: &[PathBuf]) -> Result<Vec<ParsedFile>> {
        let mut parsed = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::parse_file(path) {
                Ok(file) => parsed.push(file),
                Err(e) => {
                    warn!("Cannot use {}: {}", path.display(), e);
                    return Err(e);
                }
            }
        }
        Ok(parsed)
    }
}
