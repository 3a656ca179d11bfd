//! Common test utilities for combres integration tests

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use combres::config::{BundlingConfig, CompiledConfig};
use combres::handler::ResourceHandler;
use combres::resource::ResourceIdentifier;
use combres::store::{ByteStream, FsResourceStore, ResourceStore, StoredResource};
use tempfile::TempDir;

/// A temporary directory holding a resource root and configuration
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        std::fs::create_dir_all(path.join("resources")).expect("Failed to create resource root");
        Self { temp, path }
    }

    /// Directory the resource store is rooted at
    pub fn resources(&self) -> PathBuf {
        self.path.join("resources")
    }

    /// Write a file relative to the workspace root
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Write a resource as `<library>/<name>`, or `<name>` for an identifier without library
    pub fn write_resource(&self, id: &str, content: &str) {
        let relative = id.replacen(':', "/", 1);
        self.write_file(&format!("resources/{relative}"), content);
    }

    /// Set the modification time of a resource
    pub fn touch_resource(&self, id: &str, modified: SystemTime) {
        let relative = id.replacen(':', "/", 1);
        let file = std::fs::File::options()
            .write(true)
            .open(self.resources().join(relative))
            .expect("Failed to open resource");
        file.set_modified(modified)
            .expect("Failed to set modification time");
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    pub fn store(&self) -> FsResourceStore {
        FsResourceStore::new(self.resources()).expect("Failed to open resource root")
    }

    /// A handler over this workspace's resources configured from YAML
    pub fn handler(&self, config_yaml: &str) -> ResourceHandler {
        ResourceHandler::new(Arc::new(self.store()), compile(config_yaml))
    }
}

#[allow(dead_code)]
pub fn compile(config_yaml: &str) -> CompiledConfig {
    let raw = BundlingConfig::from_yaml(config_yaml).expect("Invalid test configuration");
    CompiledConfig::compile(&raw).expect("Configuration did not compile")
}

#[allow(dead_code)]
pub fn id(raw: &str) -> ResourceIdentifier {
    ResourceIdentifier::parse(raw).expect("Invalid identifier")
}

/// Seconds after the epoch
#[allow(dead_code)]
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Store wrapper counting lookups and opens
#[allow(dead_code)]
pub struct CountingStore<S> {
    inner: S,
    pub resolves: AtomicUsize,
    pub opens: AtomicUsize,
    /// Delay each lookup to widen race windows
    pub delay: Duration,
}

#[allow(dead_code)]
impl<S: ResourceStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            resolves: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(inner: S, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(inner)
        }
    }

    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl<S: ResourceStore> ResourceStore for CountingStore<S> {
    fn resolve(&self, id: &ResourceIdentifier) -> Option<StoredResource> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.resolve(id)
    }

    fn open(&self, resource: &StoredResource) -> io::Result<Box<dyn ByteStream>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(resource)
    }
}
