//! # Test Utilities
//!
//! Shared helpers for storage-layer tests. `TestEnvironment` owns a
//! temporary directory and a connection pointing at it; the directory is
//! deleted automatically when the environment is dropped, so tests never
//! leak files or step on each other.

use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::JsonConnection;

/// Isolated storage environment for a single test
pub struct TestEnvironment {
    /// Temporary directory (automatically deleted on drop)
    _temp_dir: TempDir,
    /// Connection pointing into the temp directory
    pub connection: JsonConnection,
    /// Base path for manual file assertions in tests
    pub base_path: PathBuf,
}

impl TestEnvironment {
    /// Create a fresh environment backed by a new temp directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path().to_path_buf();
        let connection =
            JsonConnection::new(&base_path).expect("Failed to create test connection");

        Self {
            _temp_dir: temp_dir,
            connection,
            base_path,
        }
    }

    /// Base directory of this environment
    pub fn base_directory(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_usable_connection() {
        let env = TestEnvironment::new();
        assert!(env.base_directory().exists());
        assert!(env.connection.habit_data_path().starts_with(env.base_directory()));
    }

    #[test]
    fn test_environments_are_isolated() {
        let env1 = TestEnvironment::new();
        let env2 = TestEnvironment::new();
        assert_ne!(env1.base_path, env2.base_path);
    }
}
