//! Option and result types for the compiler contract.
//!
//! Copyright (c) 2025 Lesspack Contributors

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::plugin::Plugin;
use crate::source_map::SourceMap;

/// Source map generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceMapOptions {
    /// Embed the full source text of every mapped file in the map.
    pub output_source_files: bool,
}

impl Default for SourceMapOptions {
    fn default() -> Self {
        Self {
            output_source_files: true,
        }
    }
}

/// Options accepted by [`LessImplementation::render`].
///
/// This is the pass-through option bag build tools hand to the compiler.
/// Unknown keys in serialized form are ignored so configs written for a
/// richer implementation keep deserializing. `global_vars` and
/// `modify_vars` are carried for implementations that evaluate variables;
/// the bundled implementation does not.
///
/// [`LessImplementation::render`]: crate::LessImplementation::render
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Name of the entry stylesheet, used for diagnostics and source maps.
    pub filename: Option<PathBuf>,

    /// Classic include paths searched by the native file manager.
    pub paths: Vec<PathBuf>,

    /// Generate a source map when set.
    pub source_map: Option<SourceMapOptions>,

    /// Drop blank lines and indentation from the output.
    pub compress: bool,

    /// Reject imports that appear after other statements.
    pub strict_imports: bool,

    /// Variable definitions prepended to the source.
    pub global_vars: BTreeMap<String, String>,

    /// Variable definitions appended to the source.
    pub modify_vars: BTreeMap<String, String>,

    /// Plugins installed before rendering starts.
    #[serde(skip)]
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("filename", &self.filename)
            .field("paths", &self.paths)
            .field("source_map", &self.source_map)
            .field("compress", &self.compress)
            .field("strict_imports", &self.strict_imports)
            .field("global_vars", &self.global_vars)
            .field("modify_vars", &self.modify_vars)
            .field("plugins", &format_args!("<{} plugins>", self.plugins.len()))
            .finish()
    }
}

/// Successful render result.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Compiled CSS.
    pub css: String,

    /// Source map, present when [`RenderOptions::source_map`] was set.
    pub map: Option<SourceMap>,

    /// Absolute paths of every file the render read, without the entry.
    pub imports: Vec<PathBuf>,
}

/// Per-request options passed to a file manager.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Extension to append when the specifier has none.
    pub ext: Option<String>,

    /// Include paths configured for this render.
    pub paths: Vec<PathBuf>,
}

/// A resolved and read import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Absolute path the specifier resolved to.
    pub filename: PathBuf,

    /// File contents as UTF-8 text.
    pub contents: String,
}
