/*
 * path.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Lexical path utilities shared by filesystem implementations and
 * source map normalization.
 */

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically: collapse `.` and `..` components without
/// touching the filesystem.
///
/// A `..` directly above the root is dropped. Leading `..` components of
/// a relative path are kept, since there is nothing to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let mut out = PathBuf::new();
    for part in parts {
        out.push(part.as_os_str());
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }

    out
}

/// Rewrite POSIX separators to the platform separator.
///
/// Compilers emit POSIX-style paths in source maps; dependency tracking
/// wants native ones. On POSIX platforms this is the identity.
pub fn to_native_separators(path: &str) -> PathBuf {
    if std::path::MAIN_SEPARATOR == '/' {
        PathBuf::from(path)
    } else {
        PathBuf::from(path.replace('/', std::path::MAIN_SEPARATOR_STR))
    }
}

/// Strip trailing path separators from a directory path.
///
/// Compilers hand import callbacks the current directory with a trailing
/// slash; resolvers expect it without one.
pub fn strip_trailing_separators(dir: &Path) -> PathBuf {
    let raw = dir.to_string_lossy();
    let stripped = raw.trim_end_matches(['/', '\\']);
    if stripped.is_empty() {
        // "/" would otherwise strip down to nothing
        PathBuf::from(std::path::MAIN_SEPARATOR_STR)
    } else {
        PathBuf::from(stripped)
    }
}
