/*
 * compile.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * The compile orchestrator: assembles the full option set for one
 * compilation, installs the resolution bridge, runs the compiler once,
 * and normalizes the outcome. A failed compile is terminal for this
 * build unit; rebuild scheduling belongs to the host.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lesspack_less::{
    implementation_by_name, logger, BundledLess, Level, LessImplementation, LogListener,
    SourceMap, SourceMapOptions,
};
use lesspack_vfs::normalize_path;

use crate::bridge::{BridgePlugin, BundlerFileManager};
use crate::context::{BuildContext, ResolveOptions};
use crate::dependencies::DependencySet;
use crate::error::{CompileError, CompileErrorKind};
use crate::options::{
    AdditionalData, BundlerImporter, ImplementationSpec, LoaderOptions, SourceMapSetting,
};
use crate::requests::is_unsupported_url;
use crate::source_map::normalize_source_map;

/// Outcome of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Compiled CSS text.
    pub css: String,

    /// Normalized source map, when one was requested.
    pub source_map: Option<SourceMap>,

    /// Every file this compilation depends on, entry included, in
    /// first-use order.
    pub imports: Vec<PathBuf>,
}

/// Forwards compiler log lines to the host for the duration of one
/// compile call.
struct HostLogForwarder {
    ctx: Arc<dyn BuildContext>,
}

impl LogListener for HostLogForwarder {
    fn log(&self, level: Level, message: &str) {
        self.ctx.log(level, message);
    }
}

fn record_dependency(deps: &DependencySet, ctx: &dyn BuildContext, path: &Path) {
    let normalized = normalize_path(path);
    if deps.insert(normalized.clone()) {
        ctx.add_dependency(&normalized);
    }
}

/// Compile one stylesheet.
///
/// Exactly one of output or error is produced per call. The dependency
/// set is forwarded to the host through `add_dependency` as it grows,
/// including the erroring file on failure so that fixing it retriggers
/// a rebuild.
pub async fn compile(
    source: &str,
    options: &LoaderOptions,
    ctx: Arc<dyn BuildContext>,
) -> Result<CompileOutput, CompileError> {
    tracing::debug!(resource = %ctx.resource_path().display(), "configuring less compilation");

    let implementation: Arc<dyn LessImplementation> = match &options.implementation {
        Some(ImplementationSpec::Instance(instance)) => instance.clone(),
        Some(ImplementationSpec::Name(name)) => implementation_by_name(name)
            .ok_or_else(|| CompileError::implementation_not_found(name))?,
        None => Arc::new(BundledLess::with_file_system(ctx.file_system())),
    };

    let mut render_options = options.less_options.materialize(ctx.as_ref());
    if render_options.filename.is_none() {
        render_options.filename = Some(ctx.resource_path().to_path_buf());
    }

    match options.source_map {
        Some(SourceMapSetting::Flag(true)) => {
            render_options.source_map = Some(SourceMapOptions {
                output_source_files: true,
            });
        }
        // An explicit false leaves whatever the option bag says.
        Some(SourceMapSetting::Flag(false)) => {}
        Some(SourceMapSetting::Options(map_options)) => {
            render_options.source_map = Some(map_options);
        }
        None => {
            if ctx.source_maps_enabled() && render_options.source_map.is_none() {
                render_options.source_map = Some(SourceMapOptions {
                    output_source_files: true,
                });
            }
        }
    }

    let content = match &options.additional_data {
        None => source.to_string(),
        Some(AdditionalData::Literal(data)) => format!("{}\n{}", data, source),
        Some(AdditionalData::Processor(processor)) => processor
            .process(source.to_string(), ctx.as_ref())
            .await
            .map_err(|error| {
                CompileError::host(
                    CompileErrorKind::Io,
                    format!("additional data processing failed: {}", error),
                )
            })?,
    };

    let deps = Arc::new(DependencySet::new());
    record_dependency(&deps, ctx.as_ref(), ctx.resource_path());

    match options.bundler_importer {
        BundlerImporter::Disabled => {}
        mode => {
            let resolver = ctx.resolver(ResolveOptions::stylesheet());
            let probe_conflicts =
                mode == BundlerImporter::Enabled && !render_options.paths.is_empty();
            let manager = Arc::new(BundlerFileManager::new(
                ctx.clone(),
                resolver,
                deps.clone(),
                mode == BundlerImporter::Only,
                probe_conflicts,
            ));
            render_options
                .plugins
                .insert(0, Arc::new(BridgePlugin::new(manager)));
        }
    }

    // Attached for this call only; the guard detaches on every exit path.
    let _listener = logger::add_listener(Arc::new(HostLogForwarder { ctx: ctx.clone() }));

    tracing::debug!(implementation = implementation.name(), "compiling stylesheet");

    match implementation.render(&content, &render_options).await {
        Ok(output) => {
            for import in &output.imports {
                // Scheme-qualified references are not locally
                // re-buildable and are left out of the watch set.
                if is_unsupported_url(&import.display().to_string()) {
                    continue;
                }
                record_dependency(&deps, ctx.as_ref(), import);
            }

            tracing::debug!(
                resource = %ctx.resource_path().display(),
                dependencies = deps.len(),
                "less compilation succeeded"
            );

            Ok(CompileOutput {
                css: output.css,
                source_map: output.map.map(normalize_source_map),
                imports: deps.paths(),
            })
        }
        Err(error) => {
            if let Some(filename) = &error.filename {
                record_dependency(&deps, ctx.as_ref(), filename);
            }

            tracing::debug!(resource = %ctx.resource_path().display(), "less compilation failed");

            Err(CompileError::from_render(error))
        }
    }
}
