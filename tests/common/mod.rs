#![allow(dead_code)]

use std::path::Path;

pub use toolrun_test_utils::builders;
pub use toolrun_test_utils::fake_backend::{FakeBackend, FakeRun};
pub use toolrun_test_utils::init_tracing;

use toolrun::artifacts::DirectoryRegistry;
use toolrun::engine::Engine;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Engine over `backend` registering into `root/out`, with export
/// directories created under `root/tmp`.
pub fn engine_in<B>(backend: B, root: &Path) -> Engine<B, DirectoryRegistry>
where
    B: toolrun::exec::ProcessBackend,
{
    let out = root.join("out");
    let tmp = root.join("tmp");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::create_dir_all(&tmp).unwrap();
    Engine::new(backend, DirectoryRegistry::new(out)).with_temp_root(tmp)
}

/// Number of entries left in `root/tmp` (export directories not cleaned up).
pub fn leftover_export_dirs(root: &Path) -> usize {
    std::fs::read_dir(root.join("tmp")).map(|d| d.count()).unwrap_or(0)
}
