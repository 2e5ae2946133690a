use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a file pair could not be compared
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("both file paths are required")]
    MissingPath,

    #[error("invalid file path: {}", .0.display())]
    PathTraversal(PathBuf),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error generating diff: {0}")]
    Diff(#[from] git2::Error),
}

impl CompareError {
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_kinds() {
        let p = Path::new("a.txt");
        assert!(matches!(
            CompareError::from_io(p, io::Error::from(io::ErrorKind::NotFound)),
            CompareError::NotFound(_)
        ));
        assert!(matches!(
            CompareError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied)),
            CompareError::PermissionDenied(_)
        ));
        assert!(matches!(
            CompareError::from_io(p, io::Error::other("boom")),
            CompareError::Io { .. }
        ));
    }

    #[test]
    fn messages_name_the_path() {
        let err = CompareError::NotFound(PathBuf::from("x/y.txt"));
        assert_eq!(err.to_string(), "file not found: x/y.txt");
    }
}
