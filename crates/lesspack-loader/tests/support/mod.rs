//! Shared test doubles: an in-memory build context and a resolver
//! answering from a fixed request table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lesspack_less::Level;
use lesspack_loader::{BuildContext, HostError, ImportResolver, ResolveError, ResolveOptions};
use lesspack_vfs::{FileSystem, MemoryFileSystem};

pub struct MapResolver {
    resolutions: HashMap<String, PathBuf>,
}

#[async_trait]
impl ImportResolver for MapResolver {
    async fn resolve(&self, _context_dir: &Path, request: &str) -> Result<PathBuf, ResolveError> {
        match self.resolutions.get(request) {
            Some(path) => Ok(path.clone()),
            None => Err(ResolveError::new(format!("Can't resolve '{}'", request))
                .with_details(format!("no resolution rule matches '{}'", request))
                .with_missing(vec![format!("/project/node_modules/{}", request)])),
        }
    }
}

/// Build context over a [`MemoryFileSystem`], recording every side
/// effect a compile produces.
pub struct TestContext {
    pub fs: Arc<MemoryFileSystem>,
    pub resource: PathBuf,
    pub resolutions: HashMap<String, PathBuf>,
    pub modules: HashMap<PathBuf, String>,
    pub dependencies: Mutex<Vec<PathBuf>>,
    pub logs: Mutex<Vec<(Level, String)>>,
    pub resolver_options: Mutex<Option<ResolveOptions>>,
    pub source_maps: bool,
}

impl TestContext {
    pub fn new(resource: &str) -> Self {
        Self {
            fs: Arc::new(MemoryFileSystem::with_cwd("/project")),
            resource: PathBuf::from(resource),
            resolutions: HashMap::new(),
            modules: HashMap::new(),
            dependencies: Mutex::new(Vec::new()),
            logs: Mutex::new(Vec::new()),
            resolver_options: Mutex::new(None),
            source_maps: false,
        }
    }

    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.fs.add_file(path, contents);
        self
    }

    pub fn with_resolution(mut self, request: &str, path: &str) -> Self {
        self.resolutions
            .insert(request.to_string(), PathBuf::from(path));
        self
    }

    pub fn with_module(mut self, path: &str, payload: &str) -> Self {
        self.modules.insert(PathBuf::from(path), payload.to_string());
        self
    }

    pub fn with_source_maps(mut self) -> Self {
        self.source_maps = true;
        self
    }

    /// Paths forwarded through `add_dependency`, in call order.
    pub fn recorded_dependencies(&self) -> Vec<PathBuf> {
        self.dependencies.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildContext for TestContext {
    fn resource_path(&self) -> &Path {
        &self.resource
    }

    fn file_system(&self) -> Arc<dyn FileSystem> {
        self.fs.clone()
    }

    fn resolver(&self, options: ResolveOptions) -> Arc<dyn ImportResolver> {
        *self.resolver_options.lock().unwrap() = Some(options);
        Arc::new(MapResolver {
            resolutions: self.resolutions.clone(),
        })
    }

    async fn load_module(&self, path: &Path) -> Result<String, HostError> {
        self.modules.get(path).cloned().ok_or_else(|| {
            HostError::new(format!("no loader produced output for '{}'", path.display()))
        })
    }

    fn add_dependency(&self, path: &Path) {
        self.dependencies.lock().unwrap().push(path.to_path_buf());
    }

    fn log(&self, level: Level, message: &str) {
        self.logs.lock().unwrap().push((level, message.to_string()));
    }

    fn source_maps_enabled(&self) -> bool {
        self.source_maps
    }
}
