/*
 * plugin.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Plugin contract and the registry implementations dispatch through.
 */

use std::path::Path;
use std::sync::Arc;

use crate::file_manager::FileManager;

/// A compiler plugin.
///
/// Plugins are installed once per render, before the entry file is
/// processed. A plugin that needs compiler features introduced after
/// `min_version` declares it so incompatible setups fail up front
/// instead of misbehaving mid-render.
pub trait Plugin: Send + Sync {
    /// Minimum compiler version the plugin requires.
    fn min_version(&self) -> [u32; 3] {
        [0, 0, 0]
    }

    /// Register the plugin's capabilities.
    fn install(&self, registry: &mut PluginRegistry);
}

/// Capabilities contributed by plugins for one render.
#[derive(Default)]
pub struct PluginRegistry {
    file_managers: Vec<Arc<dyn FileManager>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file manager. Managers added later take precedence, the way
    /// the compiler stacks environment file managers.
    pub fn add_file_manager(&mut self, manager: Arc<dyn FileManager>) {
        self.file_managers.push(manager);
    }

    pub fn file_managers(&self) -> &[Arc<dyn FileManager>] {
        &self.file_managers
    }

    /// The most recently added manager that supports the specifier.
    pub fn file_manager_for(
        &self,
        specifier: &str,
        current_dir: &Path,
    ) -> Option<&Arc<dyn FileManager>> {
        self.file_managers
            .iter()
            .rev()
            .find(|manager| manager.supports(specifier, current_dir))
    }

    /// Like [`PluginRegistry::file_manager_for`], restricted to managers
    /// that can load synchronously.
    pub fn sync_file_manager_for(
        &self,
        specifier: &str,
        current_dir: &Path,
    ) -> Option<&Arc<dyn FileManager>> {
        self.file_managers
            .iter()
            .rev()
            .find(|manager| manager.supports_sync() && manager.supports(specifier, current_dir))
    }
}
