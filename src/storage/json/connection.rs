use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::storage::traits::Connection;

/// JsonConnection manages the data directory and file paths for the
/// JSON-backed repositories
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: Arc<Mutex<PathBuf>>,
}

impl JsonConnection {
    /// Create a new JSON connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: Arc::new(Mutex::new(base_path)),
        })
    }

    /// Create a new JSON connection in the default data directory
    /// (~/Documents/Habit Tracker, falling back to the home directory)
    pub fn new_default() -> Result<Self> {
        let documents_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Self::new(documents_dir.join("Habit Tracker"))
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> PathBuf {
        let base_dir = self.base_directory.lock().unwrap();
        base_dir.clone()
    }

    /// Path of the habit document
    pub fn habit_data_path(&self) -> PathBuf {
        self.base_directory().join("habit_data.json")
    }

    /// Path of the market document
    pub fn market_data_path(&self) -> PathBuf {
        self.base_directory().join("market_data.json")
    }

    /// Path of the sync settings file
    pub fn settings_path(&self) -> PathBuf {
        self.base_directory().join("sync_settings.yaml")
    }

    /// Path of the cached OAuth token
    pub fn token_cache_path(&self) -> PathBuf {
        self.base_directory().join("google_token.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_base_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("data").join("tracker");

        let connection = JsonConnection::new(&nested).unwrap();

        assert!(nested.exists());
        assert_eq!(connection.base_directory(), nested);
    }

    #[test]
    fn test_data_paths_live_under_base_directory() {
        let temp_dir = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp_dir.path()).unwrap();

        assert_eq!(
            connection.habit_data_path(),
            temp_dir.path().join("habit_data.json")
        );
        assert_eq!(
            connection.market_data_path(),
            temp_dir.path().join("market_data.json")
        );
        assert_eq!(
            connection.settings_path(),
            temp_dir.path().join("sync_settings.yaml")
        );
        assert_eq!(
            connection.token_cache_path(),
            temp_dir.path().join("google_token.json")
        );
    }
}

impl Connection for JsonConnection {
    type HabitRepository = super::habit_repository::HabitRepository;
    type MarketRepository = super::market_repository::MarketRepository;

    fn create_habit_repository(&self) -> Self::HabitRepository {
        super::habit_repository::HabitRepository::new(self.clone())
    }

    fn create_market_repository(&self) -> Self::MarketRepository {
        super::market_repository::MarketRepository::new(self.clone())
    }
}
