/*
 * implementation.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * The compiler trait and the process-wide implementation registry.
 *
 * Build tools select a compiler three ways: by handing over an instance,
 * by a registered name, or by falling back to the bundled one. The
 * registry is seeded with the bundled implementation under "less" so the
 * name-based path works out of the box.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::bundled::BundledLess;
use crate::error::RenderError;
use crate::types::{RenderOptions, RenderOutput};

/// A Less compiler.
#[async_trait]
pub trait LessImplementation: Send + Sync {
    /// Implementation name, used in diagnostics.
    fn name(&self) -> &str;

    /// Compiler version as `[major, minor, patch]`, checked against
    /// plugin requirements.
    fn version(&self) -> [u32; 3];

    /// Compile Less source to CSS.
    async fn render(
        &self,
        source: &str,
        options: &RenderOptions,
    ) -> Result<RenderOutput, RenderError>;
}

static REGISTRY: Lazy<Mutex<HashMap<String, Arc<dyn LessImplementation>>>> = Lazy::new(|| {
    let mut implementations: HashMap<String, Arc<dyn LessImplementation>> = HashMap::new();
    implementations.insert("less".to_string(), Arc::new(BundledLess::new()));
    Mutex::new(implementations)
});

/// Register an implementation under a name, replacing any previous one.
pub fn register_implementation(name: impl Into<String>, implementation: Arc<dyn LessImplementation>) {
    REGISTRY.lock().unwrap().insert(name.into(), implementation);
}

/// Look up a registered implementation.
pub fn implementation_by_name(name: &str) -> Option<Arc<dyn LessImplementation>> {
    REGISTRY.lock().unwrap().get(name).cloned()
}
