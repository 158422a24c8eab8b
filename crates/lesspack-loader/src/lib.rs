//! Less compilation bridge for bundler pipelines.
//!
//! Copyright (c) 2025 Lesspack Contributors
//!
//! This crate lets a bundler compile Less stylesheets while delegating
//! import resolution (aliases, package exports, main-field probing) to
//! the host bundler's own resolver instead of the filesystem-only
//! resolver built into Less.
//!
//! The two cooperating pieces:
//! - [`BundlerFileManager`], the resolution-delegation bridge installed
//!   into the compiler as a file-manager plugin
//! - [`compile`], the orchestrator assembling options, running the
//!   compiler once, and normalizing the result or error
//!
//! The host supplies a [`BuildContext`]; everything else is configured
//! through [`LoaderOptions`].

pub mod bridge;
pub mod compile;
pub mod context;
pub mod dependencies;
pub mod error;
pub mod options;
pub mod requests;
pub mod source_map;

pub use bridge::{BridgePlugin, BundlerFileManager};
pub use compile::{compile, CompileOutput};
pub use context::{
    BuildContext, HostError, ImportResolver, ResolveError, ResolveOptions, HOST_DEFAULTS,
};
pub use dependencies::DependencySet;
pub use error::{CompileError, CompileErrorKind};
pub use options::{
    AdditionalData, AdditionalDataProcessor, BundlerImporter, ImplementationSpec,
    LessOptionsSource, LoaderOptions, SourceMapSetting,
};
pub use source_map::normalize_source_map;
