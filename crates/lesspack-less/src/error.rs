//! Error types for Less compilation.
//!
//! Copyright (c) 2025 Lesspack Contributors

use std::path::PathBuf;

use thiserror::Error;

/// Classification of a file-manager load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// No candidate path produced the file
    NotFound,

    /// The file exists but could not be read or decoded
    Unreadable,

    /// The manager cannot serve this kind of request (e.g. sync loading)
    Unsupported,

    /// Two resolution channels disagree about which file the import names
    Conflict,
}

/// Failure reported by a file manager while resolving or reading an import
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::NotFound, message)
    }

    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Unreadable, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Unsupported, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Conflict, message)
    }
}

/// Classification of a render failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    /// The source could not be parsed
    Parse,

    /// An import could not be loaded
    Import(LoadErrorKind),

    /// A configured plugin requires a newer compiler
    PluginIncompatible,
}

/// Structured render failure.
///
/// Mirrors the diagnostic shape Less reports: a message, the file the
/// failure occurred in, a 1-based line and column, and up to three lines
/// of source around the failure (the line before, the failing line, and
/// the line after, in that order; missing neighbours are omitted).
#[derive(Debug, Clone)]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub message: String,
    pub filename: Option<PathBuf>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub extract: Vec<String>,
}

impl RenderError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: RenderErrorKind::Parse,
            message: message.into(),
            filename: None,
            line: None,
            column: None,
            extract: Vec::new(),
        }
    }

    pub fn import(load_error: &LoadError) -> Self {
        Self {
            kind: RenderErrorKind::Import(load_error.kind),
            message: load_error.message.clone(),
            filename: None,
            line: None,
            column: None,
            extract: Vec::new(),
        }
    }

    pub fn plugin_incompatible(required: [u32; 3]) -> Self {
        Self {
            kind: RenderErrorKind::PluginIncompatible,
            message: format!(
                "plugin requires version {}.{}.{} or newer",
                required[0], required[1], required[2]
            ),
            filename: None,
            line: None,
            column: None,
            extract: Vec::new(),
        }
    }

    /// Attach the location the failure was observed at.
    pub fn at(mut self, filename: &std::path::Path, line: usize, column: usize) -> Self {
        self.filename = Some(filename.to_path_buf());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Attach the source window around the failing line.
    pub fn with_extract(mut self, extract: Vec<String>) -> Self {
        self.extract = extract;
        self
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(filename) = &self.filename {
            write!(f, " in {}", filename.display())?;
        }
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " on line {}, column {}", line, column)?;
        }
        Ok(())
    }
}

impl std::error::Error for RenderError {}

/// Build the extract window for a 1-based line number.
///
/// Returns the existing neighbours of the failing line in order, which is
/// what diagnostics formatters expect.
pub fn extract_window(contents: &str, line: usize) -> Vec<String> {
    if line == 0 {
        return Vec::new();
    }

    let lines: Vec<&str> = contents.lines().collect();
    let index = line - 1;
    let mut window = Vec::new();

    if index >= 1 {
        if let Some(before) = lines.get(index - 1) {
            window.push((*before).to_string());
        }
    }
    if let Some(current) = lines.get(index) {
        window.push((*current).to_string());
    }
    if let Some(after) = lines.get(index + 1) {
        window.push((*after).to_string());
    }

    window
}
