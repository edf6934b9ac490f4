//! # Sync Settings Repository
//!
//! File-based storage for remote sync preferences using a single YAML
//! file `sync_settings.yaml` at the root of the data directory.
//!
//! ## YAML Format
//!
//! ```yaml
//! cached_spreadsheet_id: "1AbC..."
//! auto_sync_enabled: false
//! auto_sync_minutes: 5
//! created_at: "2025-01-21T19:30:00Z"
//! updated_at: "2025-01-21T19:35:00Z"
//! ```
//!
//! The cached spreadsheet id is an optimization only: sync works without
//! it, and a stale id is re-resolved against the remote on the next sync.

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::connection::JsonConnection;

/// Sync preferences structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Id of the remote spreadsheet used last time (None until first sync)
    pub cached_spreadsheet_id: Option<String>,
    /// Whether the background scheduler should run
    pub auto_sync_enabled: bool,
    /// Scheduler interval in minutes
    pub auto_sync_minutes: u64,
    /// When the settings file was first created
    pub created_at: String,
    /// When the settings were last updated
    pub updated_at: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            cached_spreadsheet_id: None,
            auto_sync_enabled: false,
            auto_sync_minutes: 5,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Storage trait for sync settings operations
pub trait SettingsStorage: Send + Sync {
    /// Get the sync settings
    fn get_settings(&self) -> Result<SyncSettings>;

    /// Cache (or clear) the remote spreadsheet id
    fn set_cached_spreadsheet_id(&self, spreadsheet_id: Option<String>) -> Result<()>;

    /// Update the sync settings
    fn update_settings(&self, settings: &SyncSettings) -> Result<()>;
}

/// JSON-connection-backed settings repository using a single YAML file
#[derive(Clone)]
pub struct SettingsRepository {
    connection: JsonConnection,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    fn get_settings_path(&self) -> PathBuf {
        self.connection.settings_path()
    }

    /// Load settings from file, creating defaults if it doesn't exist
    fn load_or_create_settings(&self) -> Result<SyncSettings> {
        let settings_path = self.get_settings_path();

        if settings_path.exists() {
            let yaml_content = fs::read_to_string(&settings_path)?;
            let settings: SyncSettings = serde_yaml::from_str(&yaml_content)?;
            debug!("Loaded sync settings from {:?}", settings_path);
            Ok(settings)
        } else {
            let settings = SyncSettings::default();
            self.save_settings(&settings)?;
            info!("Created default sync settings at {:?}", settings_path);
            Ok(settings)
        }
    }

    /// Save settings to file
    fn save_settings(&self, settings: &SyncSettings) -> Result<()> {
        let settings_path = self.get_settings_path();
        let base_dir = self.connection.base_directory();

        // Ensure base directory exists
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
            info!("Created base data directory: {:?}", base_dir);
        }

        let yaml_content = serde_yaml::to_string(settings)?;

        // Use atomic write pattern: write to temp file, then rename
        let temp_path = settings_path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &settings_path)?;

        debug!("Saved sync settings to {:?}", settings_path);
        Ok(())
    }
}

impl SettingsStorage for SettingsRepository {
    fn get_settings(&self) -> Result<SyncSettings> {
        self.load_or_create_settings()
    }

    fn set_cached_spreadsheet_id(&self, spreadsheet_id: Option<String>) -> Result<()> {
        let mut settings = self.load_or_create_settings()?;
        settings.cached_spreadsheet_id = spreadsheet_id.clone();
        settings.updated_at = Utc::now().to_rfc3339();

        self.save_settings(&settings)?;

        match spreadsheet_id {
            Some(id) => info!("Cached spreadsheet id '{}'", id),
            None => info!("Cleared cached spreadsheet id"),
        }

        Ok(())
    }

    fn update_settings(&self, settings: &SyncSettings) -> Result<()> {
        let mut updated_settings = settings.clone();
        updated_settings.updated_at = Utc::now().to_rfc3339();

        self.save_settings(&updated_settings)?;
        info!("Updated sync settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_repo() -> (SettingsRepository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = JsonConnection::new(temp_dir.path()).expect("Failed to create connection");
        (SettingsRepository::new(connection), temp_dir)
    }

    #[test]
    fn test_get_settings_creates_default() {
        let (repo, _temp_dir) = setup_test_repo();

        let settings = repo.get_settings().unwrap();
        assert_eq!(settings.cached_spreadsheet_id, None);
        assert!(!settings.auto_sync_enabled);
        assert_eq!(settings.auto_sync_minutes, 5);
        assert!(!settings.created_at.is_empty());
        assert!(!settings.updated_at.is_empty());
    }

    #[test]
    fn test_set_cached_spreadsheet_id() {
        let (repo, _temp_dir) = setup_test_repo();

        repo.set_cached_spreadsheet_id(Some("sheet-123".to_string())).unwrap();

        let settings = repo.get_settings().unwrap();
        assert_eq!(settings.cached_spreadsheet_id, Some("sheet-123".to_string()));
    }

    #[test]
    fn test_clear_cached_spreadsheet_id() {
        let (repo, _temp_dir) = setup_test_repo();

        repo.set_cached_spreadsheet_id(Some("sheet-123".to_string())).unwrap();
        repo.set_cached_spreadsheet_id(None).unwrap();

        let settings = repo.get_settings().unwrap();
        assert_eq!(settings.cached_spreadsheet_id, None);
    }

    #[test]
    fn test_update_settings_stamps_updated_at() {
        let (repo, _temp_dir) = setup_test_repo();

        let mut settings = repo.get_settings().unwrap();
        let initial_updated_at = settings.updated_at.clone();

        settings.auto_sync_enabled = true;
        settings.auto_sync_minutes = 30;
        repo.update_settings(&settings).unwrap();

        let updated = repo.get_settings().unwrap();
        assert!(updated.auto_sync_enabled);
        assert_eq!(updated.auto_sync_minutes, 30);
        assert_ne!(updated.updated_at, initial_updated_at);
    }

    #[test]
    fn test_settings_persistence() {
        let (repo, temp_dir) = setup_test_repo();
        repo.set_cached_spreadsheet_id(Some("sheet-123".to_string())).unwrap();

        // Create a new repository instance (simulating app restart)
        let connection2 = JsonConnection::new(temp_dir.path()).unwrap();
        let repo2 = SettingsRepository::new(connection2);

        let settings = repo2.get_settings().unwrap();
        assert_eq!(settings.cached_spreadsheet_id, Some("sheet-123".to_string()));
    }
}
