/*
 * dependencies.rs
 * Copyright (c) 2025 Lesspack Contributors
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Files one compilation depends on.
///
/// Append-only and deduplicated by absolute path; insertion order is
/// preserved so the reported list is stable across identical compiles.
/// Owned by a single compile call but shared with the resolution bridge,
/// hence the interior lock.
#[derive(Debug, Default)]
pub struct DependencySet {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    order: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path. Returns true when it was not present before.
    pub fn insert(&self, path: PathBuf) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.seen.insert(path.clone()) {
            inner.order.push(path);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the recorded paths in first-insertion order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().order.clone()
    }
}
