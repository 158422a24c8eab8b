/*
 * traits.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Defines the FileSystem trait and supporting types for the filesystem
 * abstraction layer.
 */

use std::io;
use std::path::{Path, PathBuf};

/// Result type for filesystem operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors that can occur during filesystem operations
#[derive(Debug)]
pub enum VfsError {
    /// Standard I/O error
    Io(io::Error),

    /// Path does not exist
    NotFound(PathBuf),

    /// Operation not supported by this filesystem
    NotSupported(String),
}

impl std::fmt::Display for VfsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VfsError::Io(e) => write!(f, "I/O error: {}", e),
            VfsError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            VfsError::NotSupported(msg) => write!(f, "Operation not supported: {}", msg),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for VfsError {
    fn from(e: io::Error) -> Self {
        VfsError::Io(e)
    }
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Trait defining the read-side filesystem operations a compilation needs.
///
/// Stylesheet compilation only ever reads: entry sources, imported files,
/// and the working directory. Implementations provide those reads against
/// whatever storage the build host uses.
pub trait FileSystem: Send + Sync {
    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    ///
    /// Default implementation reads bytes and converts to string.
    fn file_read_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            VfsError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file: {}", e),
            ))
        })
    }

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> VfsResult<bool>;

    /// Check if path exists and is a file.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::File`.
    fn is_file(&self, path: &Path) -> VfsResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Check if path exists and is a directory.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::Directory`.
    fn is_dir(&self, path: &Path) -> VfsResult<bool> {
        self.path_exists(path, Some(PathKind::Directory))
    }

    /// Canonicalize a path (resolve symlinks, make absolute).
    ///
    /// Memory-backed filesystems cannot resolve symlinks; they normalize
    /// the path lexically instead.
    fn canonicalize(&self, path: &Path) -> VfsResult<PathBuf>;

    /// Get current working directory.
    fn cwd(&self) -> VfsResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vfs_error_display() {
        let err = VfsError::NotFound(PathBuf::from("/styles/missing.less"));
        assert!(err.to_string().contains("File not found"));
        assert!(err.to_string().contains("/styles/missing.less"));

        let err = VfsError::NotSupported("canonicalize on a memory tree".to_string());
        assert!(err.to_string().contains("not supported"));

        let err = VfsError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_io_error_is_source() {
        let err = VfsError::from(io::Error::new(io::ErrorKind::Other, "inner"));
        assert!(std::error::Error::source(&err).is_some());

        let err = VfsError::NotFound(PathBuf::from("/x"));
        assert!(std::error::Error::source(&err).is_none());
    }
}
