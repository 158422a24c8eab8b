/*
 * context.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * The host bundler's side of the contract. One compilation talks to the
 * bundler exclusively through BuildContext: resolver access, dependency
 * registration, virtual filesystem reads, auxiliary module builds, and
 * log forwarding.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use lesspack_less::Level;
use lesspack_vfs::FileSystem;

/// Sentinel splicing the host resolver's own defaults into a list option.
pub const HOST_DEFAULTS: &str = "...";

/// Resolver policy for one class of requests.
///
/// [`ResolveOptions::stylesheet`] is the policy this crate asks the host
/// for: stylesheet-oriented package fields first, host defaults behind
/// the [`HOST_DEFAULTS`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Dependency category the host may use for caching and filtering.
    pub dependency_type: String,

    /// Package export condition names, in priority order.
    pub condition_names: Vec<String>,

    /// Package main fields, in priority order.
    pub main_fields: Vec<String>,

    /// Directory index file names, in priority order.
    pub main_files: Vec<String>,

    /// Extensions probed when the request has none.
    pub extensions: Vec<String>,

    /// Try the request as a relative path before module lookup.
    pub prefer_relative: bool,
}

impl ResolveOptions {
    /// The stylesheet-scoped policy: stylesheet fields outrank generic
    /// ones, only stylesheet extensions are probed, and bare requests
    /// are tried relative-first.
    pub fn stylesheet() -> Self {
        Self {
            dependency_type: "less".to_string(),
            condition_names: vec![
                "less".to_string(),
                "style".to_string(),
                HOST_DEFAULTS.to_string(),
            ],
            main_fields: vec![
                "less".to_string(),
                "style".to_string(),
                "main".to_string(),
                HOST_DEFAULTS.to_string(),
            ],
            main_files: vec!["index".to_string(), HOST_DEFAULTS.to_string()],
            extensions: vec![".less".to_string(), ".css".to_string()],
            prefer_relative: true,
        }
    }
}

/// Failure from the host resolver for a single request.
///
/// `details` and `missing` carry the resolver's own diagnostics (search
/// trace, probed-but-absent paths) and are folded into the final
/// resolution error message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ResolveError {
    pub message: String,
    pub details: Option<String>,
    pub missing: Vec<String>,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            missing: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.missing = missing;
        self
    }
}

/// Failure reported by the host outside of resolution, for example while
/// building an auxiliary module.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One configured resolver instance obtained from the host.
#[async_trait]
pub trait ImportResolver: Send + Sync {
    /// Resolve `request` against `context_dir` to an absolute path.
    async fn resolve(&self, context_dir: &Path, request: &str) -> Result<PathBuf, ResolveError>;
}

/// Everything one compilation needs from the host bundler.
///
/// Implementations must be cheap to share; the orchestrator and the
/// resolution bridge both hold a clone for the duration of one compile.
#[async_trait]
pub trait BuildContext: Send + Sync {
    /// Absolute path of the stylesheet being compiled.
    fn resource_path(&self) -> &Path;

    /// The host's virtual filesystem. All file reads go through this,
    /// never through raw OS calls, so in-memory builds keep working.
    fn file_system(&self) -> Arc<dyn FileSystem>;

    /// A resolver configured with the given policy.
    fn resolver(&self, options: ResolveOptions) -> Arc<dyn ImportResolver>;

    /// Build the artifact at `path` and return its stringified contents
    /// (a JSON-encoded string payload).
    async fn load_module(&self, path: &Path) -> Result<String, HostError>;

    /// Register a file the build must watch for this compilation unit.
    fn add_dependency(&self, path: &Path);

    /// Forward a log line to the host's logging channels.
    fn log(&self, level: Level, message: &str);

    /// Whether the surrounding build has source maps switched on. Used
    /// as the default when the loader options leave source maps unset.
    fn source_maps_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_policy_prefers_stylesheet_fields() {
        let options = ResolveOptions::stylesheet();

        assert_eq!(options.dependency_type, "less");
        assert_eq!(options.main_fields[..3], ["less", "style", "main"]);
        assert_eq!(options.main_fields.last().map(String::as_str), Some(HOST_DEFAULTS));
        assert_eq!(options.extensions, [".less", ".css"]);
        assert!(options.prefer_relative);
    }

    #[test]
    fn test_resolve_error_carries_diagnostics() {
        let error = ResolveError::new("Can't resolve 'pkg'")
            .with_details("searched /project/node_modules")
            .with_missing(vec!["/project/node_modules/pkg".to_string()]);

        assert_eq!(error.to_string(), "Can't resolve 'pkg'");
        assert_eq!(error.details.as_deref(), Some("searched /project/node_modules"));
        assert_eq!(error.missing.len(), 1);
    }
}
