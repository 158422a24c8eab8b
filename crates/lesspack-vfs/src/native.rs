/*
 * native.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * FileSystem implementation backed by std::fs.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::traits::{FileSystem, PathKind, VfsError, VfsResult};

/// Filesystem implementation with direct std::fs access.
#[derive(Debug, Default, Clone)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for NativeFileSystem {
    fn file_read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VfsError::NotFound(path.to_path_buf()),
            _ => VfsError::Io(e),
        })
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> VfsResult<bool> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(VfsError::Io(e)),
        };

        Ok(match kind {
            None => true,
            Some(PathKind::File) => metadata.is_file(),
            Some(PathKind::Directory) => metadata.is_dir(),
        })
    }

    fn canonicalize(&self, path: &Path) -> VfsResult<PathBuf> {
        fs::canonicalize(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VfsError::NotFound(path.to_path_buf()),
            _ => VfsError::Io(e),
        })
    }

    fn cwd(&self) -> VfsResult<PathBuf> {
        std::env::current_dir().map_err(VfsError::Io)
    }
}
