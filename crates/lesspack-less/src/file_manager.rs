/*
 * file_manager.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * File managers resolve and read import specifiers. The compiler asks
 * each registered manager whether it supports a specifier and falls back
 * to the native manager, which probes the importing directory and the
 * configured include paths.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use lesspack_vfs::{normalize_path, FileSystem, VfsError};

use crate::error::LoadError;
use crate::types::{LoadOptions, LoadedFile};

// A path that already ends in an extension, or carries a query or
// fragment suffix, must not get another extension appended.
static HAS_EXTENSION_OR_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\.[a-z]*$)|([?;].*)$").unwrap());

// Less treats scheme-qualified, rooted, and fragment references as
// absolute and never rewrites them.
static ABSOLUTE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:[a-z-]+:|/|\\|#)").unwrap());

/// Append `ext` unless the path already has an extension or a query or
/// fragment suffix.
pub fn try_append_extension(path: &str, ext: &str) -> String {
    if HAS_EXTENSION_OR_QUERY.is_match(path) {
        path.to_string()
    } else {
        format!("{}{}", path, ext)
    }
}

/// Whether Less considers the reference absolute.
pub fn is_reference_absolute(path: &str) -> bool {
    ABSOLUTE_REFERENCE.is_match(path)
}

/// Resolves and reads files on behalf of the compiler.
///
/// Managers registered by plugins are consulted before the native one.
/// `load_file` is async because managers may delegate resolution to an
/// external service; the sync variant exists for the few compiler
/// features that need eager file access and is unsupported by default.
#[async_trait]
pub trait FileManager: Send + Sync {
    /// Whether this manager wants to handle the given specifier.
    fn supports(&self, specifier: &str, current_dir: &Path) -> bool;

    /// Whether [`FileManager::load_file_sync`] is available.
    fn supports_sync(&self) -> bool {
        false
    }

    /// Resolve the specifier against the importing directory and read it.
    async fn load_file(
        &self,
        specifier: &str,
        current_dir: &Path,
        options: &LoadOptions,
    ) -> Result<LoadedFile, LoadError>;

    /// Synchronous variant of [`FileManager::load_file`].
    fn load_file_sync(
        &self,
        specifier: &str,
        current_dir: &Path,
        options: &LoadOptions,
    ) -> Result<LoadedFile, LoadError> {
        let _ = (specifier, current_dir, options);
        Err(LoadError::unsupported(
            "synchronous loading is not supported by this file manager",
        ))
    }

    /// Append `ext` unless the specifier already carries one.
    fn try_append_extension(&self, path: &str, ext: &str) -> String {
        try_append_extension(path, ext)
    }

    /// Whether Less considers the specifier absolute.
    fn is_path_absolute(&self, path: &str) -> bool {
        is_reference_absolute(path)
    }
}

/// The compiler's built-in file manager.
///
/// Probes, in order: the specifier itself when absolute, the importing
/// directory, then each include path. The extension hint is applied
/// before probing.
pub struct NativeFileManager {
    fs: Arc<dyn FileSystem>,
}

impl NativeFileManager {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl FileManager for NativeFileManager {
    fn supports(&self, _specifier: &str, _current_dir: &Path) -> bool {
        // The native manager is the fallback for everything.
        true
    }

    fn supports_sync(&self) -> bool {
        true
    }

    async fn load_file(
        &self,
        specifier: &str,
        current_dir: &Path,
        options: &LoadOptions,
    ) -> Result<LoadedFile, LoadError> {
        self.load_file_sync(specifier, current_dir, options)
    }

    fn load_file_sync(
        &self,
        specifier: &str,
        current_dir: &Path,
        options: &LoadOptions,
    ) -> Result<LoadedFile, LoadError> {
        let filename = match &options.ext {
            Some(ext) => self.try_append_extension(specifier, ext),
            None => specifier.to_string(),
        };

        let candidates: Vec<PathBuf> = if Path::new(&filename).is_absolute() {
            vec![PathBuf::from(&filename)]
        } else {
            std::iter::once(current_dir.to_path_buf())
                .chain(options.paths.iter().cloned())
                .map(|dir| dir.join(&filename))
                .collect()
        };

        let mut tried = Vec::new();
        for candidate in candidates {
            let candidate = normalize_path(&candidate);
            match self.fs.is_file(&candidate) {
                Ok(true) => {
                    let contents = self.fs.file_read_string(&candidate).map_err(|e| {
                        LoadError::unreadable(format!(
                            "Failed to read {}: {}",
                            candidate.display(),
                            e
                        ))
                    })?;
                    return Ok(LoadedFile {
                        filename: candidate,
                        contents,
                    });
                }
                Ok(false) => tried.push(candidate),
                Err(VfsError::NotFound(_)) => tried.push(candidate),
                Err(e) => {
                    return Err(LoadError::unreadable(format!(
                        "Failed to inspect {}: {}",
                        candidate.display(),
                        e
                    )))
                }
            }
        }

        Err(LoadError::not_found(format!(
            "'{}' wasn't found. Tried - {}",
            filename,
            tried
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}
