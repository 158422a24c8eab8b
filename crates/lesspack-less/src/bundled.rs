/*
 * bundled.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * The bundled Less implementation.
 *
 * It covers the compiler surface build adapters exercise: import
 * scanning and expansion, file manager dispatch with native fallback,
 * import options, diagnostics with source excerpts, and line-mapped
 * source maps. It does not evaluate Less values; lines that are not
 * import statements pass through unchanged, and variable options
 * (global_vars, modify_vars) are not interpreted. A full compiler can
 * be substituted through the implementation registry.
 */

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use lesspack_vfs::{FileSystem, NativeFileSystem};

use crate::error::{extract_window, RenderError};
use crate::file_manager::{FileManager, NativeFileManager};
use crate::implementation::LessImplementation;
use crate::logger;
use crate::plugin::PluginRegistry;
use crate::source_map::{MappingsBuilder, SourceMap};
use crate::types::{LoadOptions, RenderOptions, RenderOutput};

/// Version reported by [`BundledLess`], checked against plugin
/// requirements.
pub const BUNDLED_VERSION: [u32; 3] = [0, 1, 0];

// One import statement on its own line, with an optional option list:
// @import (optional, reference) "target";
static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@import\s+(?:\(([^()]*)\)\s*)?([^;]+);\s*$").unwrap());

// Scheme-qualified or protocol-relative targets stay css imports.
static URL_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z\d+.-]*:|//)").unwrap());

/// The bundled compiler.
///
/// Reads files through the [`FileSystem`] it was built with, so in-memory
/// builds stay in memory.
pub struct BundledLess {
    fs: Arc<dyn FileSystem>,
}

impl BundledLess {
    /// Compiler over the native filesystem.
    pub fn new() -> Self {
        Self::with_file_system(Arc::new(NativeFileSystem::new()))
    }

    /// Compiler over the given filesystem.
    pub fn with_file_system(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Default for BundledLess {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LessImplementation for BundledLess {
    fn name(&self) -> &str {
        "less"
    }

    fn version(&self) -> [u32; 3] {
        BUNDLED_VERSION
    }

    async fn render(
        &self,
        source: &str,
        options: &RenderOptions,
    ) -> Result<RenderOutput, RenderError> {
        let mut registry = PluginRegistry::new();
        for plugin in &options.plugins {
            let required = plugin.min_version();
            if required > self.version() {
                return Err(RenderError::plugin_incompatible(required));
            }
            plugin.install(&mut registry);
        }

        let filename = options
            .filename
            .clone()
            .unwrap_or_else(|| PathBuf::from("input"));
        tracing::debug!(filename = %filename.display(), "rendering less source");

        let mut state = RenderState {
            options,
            registry,
            native: NativeFileManager::new(self.fs.clone()),
            css_lines: Vec::new(),
            mappings: MappingsBuilder::new(),
            sources: Vec::new(),
            sources_content: Vec::new(),
            imports: Vec::new(),
            seen_imports: HashSet::new(),
            expanded: HashSet::new(),
            saw_statement: false,
        };

        state.expand(source.to_string(), filename).await?;

        let RenderState {
            css_lines,
            mappings,
            sources,
            sources_content,
            imports,
            ..
        } = state;

        let css = if css_lines.is_empty() {
            String::new()
        } else {
            format!("{}\n", css_lines.join("\n"))
        };

        let map = options.source_map.map(|map_options| {
            let mut map = SourceMap::new();
            map.sources = sources;
            if map_options.output_source_files {
                map.sources_content = Some(sources_content);
            }
            map.mappings = mappings.build();
            map
        });

        Ok(RenderOutput { css, map, imports })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ImportFlags {
    reference: bool,
    inline: bool,
    less: bool,
    css: bool,
    multiple: bool,
    optional: bool,
}

enum ImportTarget {
    /// A quoted specifier to resolve.
    Specifier(String),
    /// css-level import (url form or media-qualified), emitted as-is.
    Passthrough,
    Malformed,
}

fn parse_import_flags(raw: &str, filename: &Path, line: usize) -> ImportFlags {
    let mut flags = ImportFlags::default();
    for keyword in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        match keyword {
            "reference" => flags.reference = true,
            "inline" => flags.inline = true,
            "less" => flags.less = true,
            "css" => flags.css = true,
            // once is the default
            "once" => {}
            "multiple" => flags.multiple = true,
            "optional" => flags.optional = true,
            other => logger::warn(&format!(
                "unknown @import option \"{}\" in {} on line {}",
                other,
                filename.display(),
                line
            )),
        }
    }
    flags
}

fn parse_import_target(raw: &str) -> ImportTarget {
    let trimmed = raw.trim();

    if trimmed.starts_with("url(") {
        return if trimmed.contains(')') {
            ImportTarget::Passthrough
        } else {
            ImportTarget::Malformed
        };
    }

    let bytes = trimmed.as_bytes();
    let quote = match bytes.first() {
        Some(b'"') => '"',
        Some(b'\'') => '\'',
        _ => return ImportTarget::Malformed,
    };

    match trimmed[1..].find(quote) {
        Some(end) => {
            let specifier = trimmed[1..1 + end].to_string();
            let remainder = trimmed[2 + end..].trim();
            if remainder.is_empty() {
                ImportTarget::Specifier(specifier)
            } else {
                // Media-qualified import, left for the css layer.
                ImportTarget::Passthrough
            }
        }
        None => ImportTarget::Malformed,
    }
}

fn is_url_target(specifier: &str) -> bool {
    URL_TARGET.is_match(specifier)
}

struct RenderState<'a> {
    options: &'a RenderOptions,
    registry: PluginRegistry,
    native: NativeFileManager,
    css_lines: Vec<String>,
    mappings: MappingsBuilder,
    sources: Vec<String>,
    sources_content: Vec<String>,
    imports: Vec<PathBuf>,
    seen_imports: HashSet<PathBuf>,
    expanded: HashSet<PathBuf>,
    saw_statement: bool,
}

impl RenderState<'_> {
    fn expand<'s>(
        &'s mut self,
        contents: String,
        filename: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<(), RenderError>> + Send + 's>> {
        Box::pin(async move {
            self.expanded.insert(filename.clone());
            let source = self.register_source(&filename, &contents);
            let current_dir = filename
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));

            // Statement tracking is scoped to the file being expanded.
            let parent_saw_statement = std::mem::replace(&mut self.saw_statement, false);

            for (index, line) in contents.lines().enumerate() {
                let captures = match IMPORT_LINE.captures(line) {
                    Some(captures) => captures,
                    None => {
                        self.emit_line(line, source, index);
                        continue;
                    }
                };

                let flags_raw = captures.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
                let target_raw = captures.get(2).map(|m| m.as_str()).unwrap_or("").to_string();

                // An import line, and whatever it emits or expands to, is
                // not a statement of this file.
                let saw_before_import = self.saw_statement;
                self.handle_import(
                    &flags_raw,
                    &target_raw,
                    line,
                    index,
                    source,
                    &contents,
                    &filename,
                    &current_dir,
                )
                .await?;
                self.saw_statement = saw_before_import;
            }

            self.saw_statement = parent_saw_statement;
            Ok(())
        })
    }

    async fn handle_import(
        &mut self,
        flags_raw: &str,
        target_raw: &str,
        raw_line: &str,
        line_index: usize,
        source: usize,
        contents: &str,
        filename: &Path,
        current_dir: &Path,
    ) -> Result<(), RenderError> {
        let line_number = line_index + 1;
        let column = raw_line.find('@').map(|i| i + 1).unwrap_or(1);
        let flags = parse_import_flags(flags_raw, filename, line_number);

        let specifier = match parse_import_target(target_raw) {
            ImportTarget::Specifier(specifier) => specifier,
            ImportTarget::Passthrough => {
                self.emit_line(raw_line, source, line_index);
                return Ok(());
            }
            ImportTarget::Malformed => {
                return Err(RenderError::parse("malformed import statement")
                    .at(filename, line_number, column)
                    .with_extract(extract_window(contents, line_number)));
            }
        };

        // Remote imports stay css imports and are never tracked.
        if is_url_target(&specifier) {
            self.emit_line(raw_line, source, line_index);
            return Ok(());
        }

        // Explicit css imports are left for the css layer unless (less)
        // or (inline) forces them through the compiler.
        if flags.css || (specifier.ends_with(".css") && !flags.less && !flags.inline) {
            self.emit_line(raw_line, source, line_index);
            return Ok(());
        }

        if self.options.strict_imports && self.saw_statement {
            return Err(
                RenderError::parse("import is not permitted after other statements when strict imports is enabled")
                    .at(filename, line_number, column)
                    .with_extract(extract_window(contents, line_number)),
            );
        }

        let load_options = LoadOptions {
            ext: Some(".less".to_string()),
            paths: self.options.paths.clone(),
        };

        tracing::debug!(specifier = %specifier, from = %filename.display(), "loading import");

        let manager = self.registry.file_manager_for(&specifier, current_dir).cloned();
        let load_result = match manager {
            Some(manager) => manager.load_file(&specifier, current_dir, &load_options).await,
            None => self.native.load_file(&specifier, current_dir, &load_options).await,
        };

        let loaded = match load_result {
            Ok(loaded) => loaded,
            Err(load_error) => {
                if flags.optional {
                    return Ok(());
                }
                return Err(RenderError::import(&load_error)
                    .at(filename, line_number, column)
                    .with_extract(extract_window(contents, line_number)));
            }
        };

        self.track_import(&loaded.filename);

        // Once semantics by resolved path; (multiple) bypasses them.
        if self.expanded.contains(&loaded.filename) && !flags.multiple {
            return Ok(());
        }

        if flags.reference {
            // Loaded and tracked, but nothing is emitted.
            self.expanded.insert(loaded.filename);
            return Ok(());
        }

        if flags.inline {
            self.expanded.insert(loaded.filename.clone());
            let inline_source = self.register_source(&loaded.filename, &loaded.contents);
            let lines: Vec<String> = loaded.contents.lines().map(str::to_string).collect();
            for (inline_index, inline_line) in lines.iter().enumerate() {
                self.emit_line(inline_line, inline_source, inline_index);
            }
            return Ok(());
        }

        self.expand(loaded.contents, loaded.filename).await
    }

    fn emit_line(&mut self, text: &str, source: usize, source_line: usize) {
        let line = if self.options.compress {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return;
            }
            trimmed.to_string()
        } else {
            text.trim_end().to_string()
        };

        let significant = !line.is_empty() && !line.starts_with("//") && !line.starts_with("/*");
        if significant {
            self.saw_statement = true;
        }

        self.css_lines.push(line);
        self.mappings.push_mapped(source, source_line);
    }

    fn track_import(&mut self, path: &Path) {
        if self.seen_imports.insert(path.to_path_buf()) {
            self.imports.push(path.to_path_buf());
        }
    }

    fn register_source(&mut self, filename: &Path, contents: &str) -> usize {
        let posix = filename.display().to_string().replace('\\', "/");
        if let Some(index) = self.sources.iter().position(|s| s == &posix) {
            return index;
        }
        self.sources.push(posix);
        self.sources_content.push(contents.to_string());
        self.sources.len() - 1
    }
}
