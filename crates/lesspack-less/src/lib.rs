//! Less compiler surface for Lesspack.
//!
//! Copyright (c) 2025 Lesspack Contributors
//!
//! This crate provides:
//! - The [`LessImplementation`] trait and a process-wide registry of
//!   named implementations, seeded with the bundled compiler
//! - Render and load option types shared by implementations
//! - The [`FileManager`] plugin seam with a native fallback manager
//! - A shared logger with scoped listeners
//! - Source map types with VLQ mappings encoding

pub mod bundled;
pub mod error;
pub mod file_manager;
pub mod implementation;
pub mod logger;
pub mod plugin;
pub mod source_map;
pub mod types;

pub use bundled::{BundledLess, BUNDLED_VERSION};
pub use error::{
    extract_window, LoadError, LoadErrorKind, RenderError, RenderErrorKind,
};
pub use file_manager::{
    is_reference_absolute, try_append_extension, FileManager, NativeFileManager,
};
pub use implementation::{implementation_by_name, register_implementation, LessImplementation};
pub use logger::{Level, ListenerGuard, LogListener};
pub use plugin::{Plugin, PluginRegistry};
pub use source_map::{MappingsBuilder, SourceMap};
pub use types::{LoadOptions, LoadedFile, RenderOptions, RenderOutput, SourceMapOptions};
