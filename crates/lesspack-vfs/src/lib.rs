/*
 * lesspack-vfs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Filesystem abstraction for build environments.
 *
 * Stylesheet compilation runs inside build hosts whose inputs are not
 * always on disk: dev servers serve generated assets from memory, and
 * tests want hermetic trees. All file access in this workspace goes
 * through the FileSystem trait so the same compilation code serves both:
 *
 * - NativeFileSystem: direct std::fs access (default for real builds)
 * - MemoryFileSystem: in-memory tree keyed by normalized paths
 */

mod memory;
mod native;
mod path;
mod traits;

// Re-export core types (API surface)
pub use traits::{FileSystem, PathKind, VfsError, VfsResult};

// Re-export filesystem implementations
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;

// Re-export path utilities
pub use path::{normalize_path, strip_trailing_separators, to_native_separators};
