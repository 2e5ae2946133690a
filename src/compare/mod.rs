//! File access and diff generation
//!
//! Resolves and reads the two sides of a pair, decides whether they are
//! identical, and produces unified diff text for the core to parse.

mod error;
mod pairs;
mod patch;

pub use error::CompareError;
pub use pairs::{load_pairs_file, pair_from_arg, pairs_from_dirs};
pub use patch::diff_text;

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::diff::is_binary;

/// Two paths to compare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    #[serde(default)]
    pub index: usize,
    pub file1: PathBuf,
    pub file2: PathBuf,
}

impl FilePair {
    pub fn new(index: usize, file1: impl Into<PathBuf>, file2: impl Into<PathBuf>) -> Self {
        Self {
            index,
            file1: file1.into(),
            file2: file2.into(),
        }
    }
}

/// Outcome of comparing one pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub index: usize,
    pub file1: String,
    pub file2: String,
    /// Unified diff text; empty for identical or binary pairs
    pub diff: String,
    pub identical: bool,
    pub binary: bool,
}

/// A compared pair with both contents kept for raw view and highlighting
#[derive(Debug, Clone)]
pub struct Comparison {
    pub result: DiffResult,
    pub left_content: String,
    pub right_content: String,
}

/// Reads file pairs and produces diffs
#[derive(Debug, Clone)]
pub struct Comparator {
    base_path: Option<PathBuf>,
    context_lines: u32,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(None, 3)
    }
}

impl Comparator {
    pub fn new(base_path: Option<PathBuf>, context_lines: u32) -> Self {
        Self {
            base_path,
            context_lines,
        }
    }

    /// Resolve a user-supplied path. With a base path configured, paths are
    /// confined to it: `..` components and absolute paths are rejected.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, CompareError> {
        if path.as_os_str().is_empty() {
            return Err(CompareError::MissingPath);
        }
        match &self.base_path {
            Some(base) => {
                let escapes = path
                    .components()
                    .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
                if escapes {
                    return Err(CompareError::PathTraversal(path.to_path_buf()));
                }
                Ok(base.join(path))
            }
            None => Ok(path.to_path_buf()),
        }
    }

    /// Read a resolved path as raw bytes
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, CompareError> {
        let meta = std::fs::metadata(path).map_err(|e| CompareError::from_io(path, e))?;
        if !meta.is_file() {
            return Err(CompareError::NotAFile(path.to_path_buf()));
        }
        std::fs::read(path).map_err(|e| CompareError::from_io(path, e))
    }

    pub fn compare(&self, pair: &FilePair) -> Result<Comparison, CompareError> {
        let left_path = self.resolve(&pair.file1)?;
        let right_path = self.resolve(&pair.file2)?;
        let left = self.read(&left_path)?;
        let right = self.read(&right_path)?;

        let identical = left == right;
        let left_content = String::from_utf8_lossy(&left).into_owned();
        let right_content = String::from_utf8_lossy(&right).into_owned();
        let binary = is_binary(&left_content) || is_binary(&right_content);

        let diff = if identical || binary {
            String::new()
        } else {
            diff_text(
                &left,
                &right,
                &display_name(&pair.file1),
                &display_name(&pair.file2),
                self.context_lines,
            )?
        };

        log::debug!(
            "Compared pair #{} ({} vs {}): identical={} binary={}",
            pair.index,
            pair.file1.display(),
            pair.file2.display(),
            identical,
            binary
        );

        Ok(Comparison {
            result: DiffResult {
                index: pair.index,
                file1: pair.file1.display().to_string(),
                file2: pair.file2.display().to_string(),
                diff,
                identical,
                binary,
            },
            left_content,
            right_content,
        })
    }
}

/// File name used in diff headers
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
