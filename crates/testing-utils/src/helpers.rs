//! Test helper utilities and common testing patterns

use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Wait for a condition to be true with timeout
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }

        false
    }
}

/// A temporary directory of sized files, removed on drop
pub struct FileFixture {
    dir: TempDir,
}

impl FileFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Create a sparse file of `size` bytes and return its path
    pub fn create(&self, name: &str, size: u64) -> String {
        let path = self.path(name);
        let file = std::fs::File::create(&path).expect("Failed to create fixture file");
        file.set_len(size).expect("Failed to size fixture file");
        path.to_string_lossy().into_owned()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for FileFixture {
    fn default() -> Self {
        Self::new()
    }
}
