/*
 * error.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Loader-side error taxonomy and the user-facing message format.
 * Compiler stack traces are never surfaced; the formatted message leads
 * with a short source excerpt and a caret under the failing column.
 */

use std::path::PathBuf;

use lesspack_less::{LoadErrorKind, RenderError, RenderErrorKind};
use lesspack_vfs::normalize_path;

/// Terminal failure classes for one compile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// No candidate specifier resolved through either resolver.
    ResolutionNotFound,

    /// An import was satisfiable through classic include-paths and the
    /// bundler resolver at once, with different results.
    MixedResolverConflict,

    /// The compiler rejected the stylesheet.
    Syntax,

    /// A resolved path could not be read or loaded.
    Io,

    /// The configured implementation name is not registered.
    ImplementationNotFound,
}

/// One compilation failure, already formatted for the host's output.
///
/// The structured location fields survive alongside the formatted
/// message so hosts can do their own rendering; the originating compiler
/// error is retained as the source.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub filename: Option<PathBuf>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub extract: Vec<String>,
    #[source]
    pub source: Option<RenderError>,
}

impl CompileError {
    pub fn implementation_not_found(name: &str) -> Self {
        Self {
            kind: CompileErrorKind::ImplementationNotFound,
            message: format!("the Less implementation \"{}\" is not registered", name),
            filename: None,
            line: None,
            column: None,
            extract: Vec::new(),
            source: None,
        }
    }

    pub fn host(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            filename: None,
            line: None,
            column: None,
            extract: Vec::new(),
            source: None,
        }
    }

    pub fn from_render(error: RenderError) -> Self {
        let kind = match error.kind {
            RenderErrorKind::Import(LoadErrorKind::NotFound) => CompileErrorKind::ResolutionNotFound,
            RenderErrorKind::Import(LoadErrorKind::Conflict) => {
                CompileErrorKind::MixedResolverConflict
            }
            RenderErrorKind::Import(LoadErrorKind::Unreadable)
            | RenderErrorKind::Import(LoadErrorKind::Unsupported) => CompileErrorKind::Io,
            RenderErrorKind::Parse | RenderErrorKind::PluginIncompatible => {
                CompileErrorKind::Syntax
            }
        };

        Self {
            kind,
            message: format_render_error(&error),
            filename: error.filename.clone(),
            line: error.line,
            column: error.column,
            extract: error.extract.clone(),
            source: Some(error),
        }
    }
}

/// Up to two excerpt lines ending at the failing line, plus a caret
/// marker under the failing column.
fn file_excerpt(error: &RenderError) -> Vec<String> {
    if error.extract.is_empty() {
        return Vec::new();
    }

    // The first extract entry is the line before the failing line,
    // except on line one where the failing line leads.
    let take = if error.line.unwrap_or(1) <= 1 { 1 } else { 2 };
    let mut excerpt: Vec<String> = error.extract.iter().take(take).cloned().collect();

    let indent = error.column.unwrap_or(1).saturating_sub(1);
    excerpt.push(format!("{}^", " ".repeat(indent)));

    excerpt
}

fn capitalize_first(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The single multi-line message shown to the user: excerpt, caret,
/// capitalized compiler message, and a location trailer.
pub fn format_render_error(error: &RenderError) -> String {
    let location = match (&error.filename, error.line, error.column) {
        (Some(filename), Some(line), Some(column)) => format!(
            "      Error in {} (line {}, column {})",
            normalize_path(filename).display(),
            line,
            column
        ),
        _ => String::new(),
    };

    let mut parts = vec!["\n".to_string()];
    parts.extend(file_excerpt(error));
    parts.push(capitalize_first(&error.message));
    parts.push(location);

    parts.join("\n")
}
