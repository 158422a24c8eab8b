/*
 * memory.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * In-memory FileSystem for tests and hosts whose sources never touch disk.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::path::normalize_path;
use crate::traits::{FileSystem, PathKind, VfsError, VfsResult};

/// In-memory filesystem keyed by normalized absolute paths.
///
/// Directories are implicit: a directory exists when some file lives
/// beneath it. Relative lookups resolve against the configured working
/// directory.
#[derive(Debug)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
    cwd: PathBuf,
}

impl MemoryFileSystem {
    /// Create an empty filesystem rooted at `/`.
    pub fn new() -> Self {
        Self::with_cwd("/")
    }

    /// Create an empty filesystem with the given working directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            cwd: cwd.into(),
        }
    }

    /// Add a file, replacing any previous contents at the same path.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let key = self.resolve(path.as_ref());
        self.files.write().unwrap().insert(key, contents.into());
    }

    /// Number of files in the tree.
    pub fn file_count(&self) -> usize {
        self.files.read().unwrap().len()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.cwd.join(path))
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemoryFileSystem {
    fn file_read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let key = self.resolve(path);
        let files = self.files.read().unwrap();
        files.get(&key).cloned().ok_or(VfsError::NotFound(key))
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> VfsResult<bool> {
        let key = self.resolve(path);
        let files = self.files.read().unwrap();
        let is_file = files.contains_key(&key);
        let is_dir = !is_file && files.keys().any(|p| p != &key && p.starts_with(&key));

        Ok(match kind {
            None => is_file || is_dir,
            Some(PathKind::File) => is_file,
            Some(PathKind::Directory) => is_dir,
        })
    }

    fn canonicalize(&self, path: &Path) -> VfsResult<PathBuf> {
        // No symlinks in a memory tree, so lexical normalization is enough.
        let key = self.resolve(path);
        if self.path_exists(&key, None)? {
            Ok(key)
        } else {
            Err(VfsError::NotFound(key))
        }
    }

    fn cwd(&self) -> VfsResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
