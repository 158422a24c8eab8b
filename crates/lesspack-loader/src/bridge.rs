/*
 * bridge.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * The resolution-delegation bridge: a compiler file manager that maps
 * import specifiers onto the host bundler's resolver. Plain specifiers
 * are still offered to the compiler's native manager first so relative
 * imports keep working without a resolver round-trip; only a native
 * not-found hands the request over to the bundler side.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use lesspack_less::{
    FileManager, LoadError, LoadErrorKind, LoadOptions, LoadedFile, NativeFileManager, Plugin,
    PluginRegistry,
};
use lesspack_vfs::{normalize_path, strip_trailing_separators};

use crate::context::{BuildContext, ImportResolver, ResolveError};
use crate::dependencies::DependencySet;
use crate::requests::{
    candidate_requests, is_less_compatible, is_native_win32_path, is_special_module_import,
};

/// File manager backed by the host bundler's resolver.
pub struct BundlerFileManager {
    ctx: Arc<dyn BuildContext>,
    resolver: Arc<dyn ImportResolver>,
    native: NativeFileManager,
    deps: Arc<DependencySet>,
    only_mode: bool,
    probe_conflicts: bool,
}

impl BundlerFileManager {
    /// `only_mode` skips the native attempt entirely; `probe_conflicts`
    /// cross-checks native successes against the bundler resolver when
    /// classic include-paths are also configured.
    pub fn new(
        ctx: Arc<dyn BuildContext>,
        resolver: Arc<dyn ImportResolver>,
        deps: Arc<DependencySet>,
        only_mode: bool,
        probe_conflicts: bool,
    ) -> Self {
        let native = NativeFileManager::new(ctx.file_system());
        Self {
            ctx,
            resolver,
            native,
            deps,
            only_mode,
            probe_conflicts,
        }
    }

    async fn resolve_candidates(
        &self,
        context_dir: &Path,
        requests: &[String],
    ) -> Result<PathBuf, ResolveError> {
        if requests.is_empty() {
            return Err(ResolveError::new("No possible requests to resolve"));
        }

        let mut failure = None;
        for request in requests {
            tracing::trace!(request = %request, context = %context_dir.display(), "trying bundler resolver");
            match self.resolver.resolve(context_dir, request).await {
                Ok(resolved) => return Ok(resolved),
                Err(error) => failure = Some(error),
            }
        }

        Err(failure.unwrap_or_else(|| ResolveError::new("No possible requests to resolve")))
    }

    /// A native hit is still cross-checked against the bundler resolver
    /// when both resolution styles are configured; agreement proceeds,
    /// disagreement is a hard error instead of a silent preference.
    async fn accept_native(
        &self,
        specifier: &str,
        context_dir: &Path,
        candidates: &[String],
        loaded: LoadedFile,
    ) -> Result<LoadedFile, LoadError> {
        let absolute = self.absolutize(&loaded.filename)?;

        if self.probe_conflicts {
            if let Ok(resolved) = self.resolve_candidates(context_dir, candidates).await {
                let bundler = self.absolutize(&resolved)?;
                if bundler != absolute {
                    return Err(LoadError::conflict(mixed_resolvers_message(
                        specifier, &absolute, &bundler,
                    )));
                }
            }
        }

        self.record_dependency(&absolute);

        Ok(LoadedFile {
            filename: absolute,
            contents: loaded.contents,
        })
    }

    async fn read_resolved(&self, path: &Path) -> Result<LoadedFile, LoadError> {
        if is_less_compatible(&path.display().to_string()) {
            let contents = self
                .ctx
                .file_system()
                .file_read_string(path)
                .map_err(|error| {
                    LoadError::unreadable(format!(
                        "failed to read '{}': {}",
                        path.display(),
                        error
                    ))
                })?;

            return Ok(LoadedFile {
                filename: path.to_path_buf(),
                contents,
            });
        }

        // Non-stylesheet assets come back from the host's stringify
        // pipeline as a JSON-encoded string payload.
        let payload = self.ctx.load_module(path).await.map_err(|error| {
            LoadError::unreadable(format!(
                "failed to load module '{}': {}",
                path.display(),
                error
            ))
        })?;
        let contents: String = serde_json::from_str(&payload).map_err(|error| {
            LoadError::unreadable(format!(
                "failed to decode stringified module '{}': {}",
                path.display(),
                error
            ))
        })?;

        Ok(LoadedFile {
            filename: path.to_path_buf(),
            contents,
        })
    }

    fn absolutize(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if path.is_absolute() {
            return Ok(normalize_path(path));
        }

        let cwd = self.ctx.file_system().cwd().map_err(|error| {
            LoadError::unreadable(format!(
                "cannot resolve '{}' against the current directory: {}",
                path.display(),
                error
            ))
        })?;

        Ok(normalize_path(&cwd.join(path)))
    }

    fn record_dependency(&self, path: &Path) {
        if self.deps.insert(path.to_path_buf()) {
            self.ctx.add_dependency(path);
        }
    }
}

#[async_trait]
impl FileManager for BundlerFileManager {
    /// Absolute native filesystem paths stay with the compiler's default
    /// manager; everything else is handled here.
    fn supports(&self, specifier: &str, _current_dir: &Path) -> bool {
        !(specifier.starts_with('/') || is_native_win32_path(specifier))
    }

    /// Synchronous demands fall back to the native manager; the host
    /// resolver has no synchronous form.
    fn supports_sync(&self) -> bool {
        false
    }

    async fn load_file(
        &self,
        specifier: &str,
        current_dir: &Path,
        options: &LoadOptions,
    ) -> Result<LoadedFile, LoadError> {
        // The compiler passes the directory with a trailing slash; the
        // resolver context must not have one.
        let context_dir = strip_trailing_separators(current_dir);
        let candidates = candidate_requests(specifier, options.ext.as_deref());

        let mut native_failure = None;
        if !(self.only_mode || is_special_module_import(specifier)) {
            match self.native.load_file(specifier, current_dir, options).await {
                Ok(loaded) => {
                    return self
                        .accept_native(specifier, &context_dir, &candidates, loaded)
                        .await;
                }
                Err(error) if error.kind == LoadErrorKind::NotFound => {
                    native_failure = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        let resolved = match self.resolve_candidates(&context_dir, &candidates).await {
            Ok(resolved) => resolved,
            Err(resolve_error) => {
                return Err(combine_resolver_failure(native_failure, &resolve_error));
            }
        };

        let absolute = self.absolutize(&resolved)?;
        self.record_dependency(&absolute);
        self.read_resolved(&absolute).await
    }
}

/// Plugin that registers the bridge with the compiler.
pub struct BridgePlugin {
    manager: Arc<BundlerFileManager>,
}

impl BridgePlugin {
    pub fn new(manager: Arc<BundlerFileManager>) -> Self {
        Self { manager }
    }
}

impl Plugin for BridgePlugin {
    fn install(&self, registry: &mut PluginRegistry) {
        registry.add_file_manager(self.manager.clone());
    }
}

fn mixed_resolvers_message(specifier: &str, native: &Path, bundler: &Path) -> String {
    format!(
        "'{}' is satisfiable by both resolvers: the include paths give {} while the bundler resolver gives {}; drop the include path or rewrite the import so only one applies",
        specifier,
        native.display(),
        bundler.display()
    )
}

/// Both failure traces folded into one message, so the user sees why the
/// native lookup failed and why the bundler lookup failed. When the
/// native attempt was skipped, the bundler failure leads.
fn combine_resolver_failure(native: Option<LoadError>, resolve_error: &ResolveError) -> LoadError {
    let lead = match &native {
        Some(error) => format!("Less resolver error:\n{}", error.message),
        None => format!("Bundler resolver error:\n{}", resolve_error.message),
    };

    let details = resolve_error.details.as_deref().unwrap_or("none");
    let missing = if resolve_error.missing.is_empty() {
        "none".to_string()
    } else {
        resolve_error.missing.join(", ")
    };

    LoadError::not_found(format!(
        "{}\n\nBundler resolver error details:\n{}\n\nBundler resolver error missing:\n{}\n\n",
        lead, details, missing
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use lesspack_less::Level;
    use lesspack_vfs::{FileSystem, PathKind, VfsError, VfsResult};

    use crate::context::{HostError, ResolveOptions};

    /// Filesystem with no working directory, as a sandboxed host might
    /// present.
    struct BrokenCwdFs;

    impl FileSystem for BrokenCwdFs {
        fn file_read(&self, path: &Path) -> VfsResult<Vec<u8>> {
            Err(VfsError::NotFound(path.to_path_buf()))
        }

        fn path_exists(&self, _path: &Path, _kind: Option<PathKind>) -> VfsResult<bool> {
            Ok(false)
        }

        fn canonicalize(&self, path: &Path) -> VfsResult<PathBuf> {
            Ok(path.to_path_buf())
        }

        fn cwd(&self) -> VfsResult<PathBuf> {
            Err(VfsError::NotSupported("no working directory".to_string()))
        }
    }

    /// Resolver that answers every request with a relative path.
    struct RelativeResolver;

    #[async_trait]
    impl ImportResolver for RelativeResolver {
        async fn resolve(
            &self,
            _context_dir: &Path,
            _request: &str,
        ) -> Result<PathBuf, ResolveError> {
            Ok(PathBuf::from("vendor/basic.less"))
        }
    }

    struct BrokenCwdContext {
        resource: PathBuf,
    }

    #[async_trait]
    impl BuildContext for BrokenCwdContext {
        fn resource_path(&self) -> &Path {
            &self.resource
        }

        fn file_system(&self) -> Arc<dyn FileSystem> {
            Arc::new(BrokenCwdFs)
        }

        fn resolver(&self, _options: ResolveOptions) -> Arc<dyn ImportResolver> {
            Arc::new(RelativeResolver)
        }

        async fn load_module(&self, path: &Path) -> Result<String, HostError> {
            Err(HostError::new(format!(
                "no loader produced output for '{}'",
                path.display()
            )))
        }

        fn add_dependency(&self, _path: &Path) {}

        fn log(&self, _level: Level, _message: &str) {}
    }

    #[tokio::test]
    async fn test_cwd_failure_surfaces_for_relative_resolutions() {
        let ctx = Arc::new(BrokenCwdContext {
            resource: PathBuf::from("/project/src/entry.less"),
        });
        let deps = Arc::new(DependencySet::new());
        let manager = BundlerFileManager::new(
            ctx,
            Arc::new(RelativeResolver),
            deps.clone(),
            true,
            false,
        );

        let error = manager
            .load_file("basic", Path::new("/project/src/"), &LoadOptions::default())
            .await
            .unwrap_err();

        assert_eq!(error.kind, LoadErrorKind::Unreadable);
        assert!(
            error.message.contains("current directory"),
            "unexpected message: {}",
            error.message
        );
        assert!(
            deps.is_empty(),
            "a path that cannot be absolutized must not be recorded"
        );
    }

    #[test]
    fn test_combined_failure_keeps_both_traces() {
        let native = LoadError::not_found("'gone' wasn't found. Tried - /styles/gone.less");
        let resolve_error = ResolveError::new("Can't resolve 'gone'")
            .with_details("searched /project/node_modules")
            .with_missing(vec!["/project/node_modules/gone".to_string()]);

        let combined = combine_resolver_failure(Some(native), &resolve_error);

        assert_eq!(combined.kind, LoadErrorKind::NotFound);
        assert_eq!(
            combined.message,
            "Less resolver error:\n'gone' wasn't found. Tried - /styles/gone.less\n\n\
             Bundler resolver error details:\nsearched /project/node_modules\n\n\
             Bundler resolver error missing:\n/project/node_modules/gone\n\n"
        );
    }

    #[test]
    fn test_combined_failure_without_native_attempt() {
        let resolve_error = ResolveError::new("Can't resolve 'widgets/'");

        let combined = combine_resolver_failure(None, &resolve_error);

        assert!(combined
            .message
            .starts_with("Bundler resolver error:\nCan't resolve 'widgets/'"));
        assert!(combined.message.contains("Bundler resolver error details:\nnone"));
        assert!(combined.message.contains("Bundler resolver error missing:\nnone"));
    }
}
