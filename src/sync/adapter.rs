//! # Sheets Sync Adapter
//!
//! Orchestrates a sync against the remote spreadsheet: resolves which
//! document to use, keeps its tab schema complete, and moves snapshots
//! in and out through the row codec.
//!
//! Document resolution order:
//! 1. the cached spreadsheet id, if it still points at a live document
//! 2. a Drive search for the well-known name
//! 3. creating a fresh document with all tabs and headers
//!
//! An upload is a full overwrite: clear every data range, then write the
//! snapshot in one batch. Merge decisions happen locally before upload,
//! never in the spreadsheet.

use anyhow::Result;
use log::{info, warn};

use crate::domain::models::RemoteSnapshot;
use crate::storage::json::SettingsStorage;
use crate::sync::rows;
use crate::sync::traits::{AuthProvider, RangeUpdate, TabularStore};

/// Name of the spreadsheet in the user's Drive
pub const SPREADSHEET_NAME: &str = "My Habit Tracker";

/// Sync adapter generic over auth, remote store and settings
pub struct SheetsSyncAdapter<A: AuthProvider, T: TabularStore, S: SettingsStorage> {
    auth: A,
    store: T,
    settings: S,
}

impl<A, T, S> SheetsSyncAdapter<A, T, S>
where
    A: AuthProvider,
    T: TabularStore,
    S: SettingsStorage,
{
    pub fn new(auth: A, store: T, settings: S) -> Self {
        Self {
            auth,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Run the auth flow if needed and report whether a token is available
    pub async fn authenticate(&self) -> Result<()> {
        self.auth.access_token().await?;
        Ok(())
    }

    /// Resolve the spreadsheet to sync with, creating it on first use.
    /// The resolved id is cached in the settings for next time.
    pub async fn locate_or_create_document(&self) -> Result<String> {
        let token = self.auth.access_token().await?;

        // A cached id that fails validation is treated as stale, never fatal
        if let Some(cached) = self.settings.get_settings()?.cached_spreadsheet_id {
            match self.store.document_exists(&token, &cached).await {
                Ok(true) => {
                    self.ensure_schema(&token, &cached).await?;
                    return Ok(cached);
                }
                Ok(false) => warn!("⚠️ Cached spreadsheet {} no longer exists", cached),
                Err(e) => warn!("⚠️ Could not validate cached spreadsheet {}: {}", cached, e),
            }
        }

        if let Some(document_id) = self.store.find_document(&token, SPREADSHEET_NAME).await? {
            info!("Found existing spreadsheet {}", document_id);
            self.ensure_schema(&token, &document_id).await?;
            self.settings.set_cached_spreadsheet_id(Some(document_id.clone()))?;
            return Ok(document_id);
        }

        let tabs: Vec<String> = rows::SHEET_TABS.iter().map(|tab| tab.to_string()).collect();
        let document_id = self
            .store
            .create_document(&token, SPREADSHEET_NAME, &tabs)
            .await?;
        self.store
            .batch_update(&token, &document_id, &rows::header_updates())
            .await?;
        self.settings.set_cached_spreadsheet_id(Some(document_id.clone()))?;

        info!("✅ Created spreadsheet {}", document_id);
        Ok(document_id)
    }

    /// Add any tabs the schema requires but the document lacks, writing
    /// headers only into the newly added ones
    async fn ensure_schema(&self, token: &str, document_id: &str) -> Result<()> {
        let existing = self.store.list_tabs(token, document_id).await?;
        let missing: Vec<String> = rows::SHEET_TABS
            .iter()
            .filter(|tab| !existing.iter().any(|name| name == *tab))
            .map(|tab| tab.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        self.store.add_tabs(token, document_id, &missing).await?;
        let header_writes: Vec<RangeUpdate> =
            missing.iter().map(|tab| rows::header_update(tab)).collect();
        self.store
            .batch_update(token, document_id, &header_writes)
            .await?;

        info!("Added {} missing tabs to spreadsheet {}", missing.len(), document_id);
        Ok(())
    }

    /// Overwrite the remote document with this snapshot
    pub async fn upload(&self, snapshot: &RemoteSnapshot) -> Result<()> {
        let document_id = self.locate_or_create_document().await?;
        let token = self.auth.access_token().await?;

        self.store
            .batch_clear(&token, &document_id, &rows::data_ranges())
            .await?;

        let updates = rows::snapshot_updates(snapshot);
        if !updates.is_empty() {
            self.store.batch_update(&token, &document_id, &updates).await?;
        }

        info!("✅ SYNC: Uploaded snapshot to spreadsheet {}", document_id);
        Ok(())
    }

    /// Read the remote document back as a snapshot
    pub async fn download(&self) -> Result<RemoteSnapshot> {
        let document_id = self.locate_or_create_document().await?;
        let token = self.auth.access_token().await?;

        let tables = self
            .store
            .batch_get(&token, &document_id, &rows::data_ranges())
            .await?;

        info!("✅ SYNC: Downloaded snapshot from spreadsheet {}", document_id);
        Ok(rows::snapshot_from_tables(&tables))
    }

    /// Browser URL of the synced spreadsheet, once one has been resolved
    pub fn document_url(&self) -> Result<Option<String>> {
        Ok(self
            .settings
            .get_settings()?
            .cached_spreadsheet_id
            .map(|id| format!("https://docs.google.com/spreadsheets/d/{}", id)))
    }

    /// Revoke credentials and forget the cached document id
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.settings.set_cached_spreadsheet_id(None)?;
        info!("Signed out; cleared cached spreadsheet id");
        Ok(())
    }
}
