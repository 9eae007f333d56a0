#![allow(dead_code, unused_imports)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use xrun::config::Config;
use xrun::engine::EventLoop;
use xrun::exec::{artifact_name, BuildSettings, BuildSupervisor};
use xrun::fs::mock::MockFileSystem;
use xrun::fs::FileSystem;
use xrun::watch::{event_queue, ChangeFilter, EventSender, FileStateCache, WatchSet};

pub use xrun_test_utils::builders::ConfigBuilder;
pub use xrun_test_utils::fake_launcher::{FakeLauncher, LaunchEvent};
pub use xrun_test_utils::fake_registry::FakeRegistry;
pub use xrun_test_utils::{init_tracing, with_timeout};

/// Root of the in-memory project used by most tests.
pub const ROOT: &str = "/proj";

pub fn root() -> PathBuf {
    PathBuf::from(ROOT)
}

/// `/proj/<rel>`.
pub fn p(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

/// In-memory project containing the given `(relative path, content)` files.
pub fn mock_project(files: &[(&str, &str)]) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(ROOT);
    for (rel, content) in files {
        fs.add_file(p(rel), content);
    }
    fs
}

pub fn default_config() -> Config {
    ConfigBuilder::new().build(&root())
}

/// Everything the event loop needs, wired to fakes.
pub struct Harness {
    pub fs: MockFileSystem,
    pub registry: FakeRegistry,
    pub launcher: FakeLauncher,
    pub sender: EventSender,
    pub cache: Arc<FileStateCache>,
    pub supervisor: Arc<BuildSupervisor>,
    pub event_loop: EventLoop<FakeRegistry>,
}

impl Harness {
    /// Wire up a loop over `fs` and run the initial watch registration.
    pub fn new(fs: MockFileSystem, config: Config) -> Self {
        Self::with_capacity(fs, config, 64)
    }

    pub fn with_capacity(fs: MockFileSystem, config: Config, capacity: usize) -> Self {
        let root = root();
        let shared_fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
        let config = Arc::new(config);

        let (sender, receiver) = event_queue(capacity);
        let registry = FakeRegistry::new();
        let cache = Arc::new(FileStateCache::new(root.clone(), Arc::clone(&shared_fs)));

        let mut watches = WatchSet::new(registry.clone(), Arc::clone(&shared_fs));
        watches
            .register_initial(&root, &config, &cache)
            .expect("initial registration");

        let launcher = FakeLauncher::new("go");
        let settings = BuildSettings::new(&root, &config, Vec::new());
        let supervisor = Arc::new(BuildSupervisor::new(settings, Arc::new(launcher.clone())));

        let filter = ChangeFilter::new(
            root.clone(),
            Arc::clone(&config),
            artifact_name(&root),
            shared_fs,
        );
        let event_loop = EventLoop::new(
            receiver,
            filter,
            Arc::clone(&cache),
            watches,
            Arc::clone(&supervisor),
        );

        Self {
            fs,
            registry,
            launcher,
            sender,
            cache,
            supervisor,
            event_loop,
        }
    }
}
