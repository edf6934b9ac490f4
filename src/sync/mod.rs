//! # Sync Module
//!
//! Everything needed to mirror local data into a Google Sheets document
//! and back.
//!
//! ## Module Organization
//!
//! - **traits**: `AuthProvider` and `TabularStore`, the two seams to the
//!   outside world
//! - **google**: OAuth installed-app flow and the Sheets/Drive REST client
//! - **rows**: the fixed tab layout and row encode/decode
//! - **adapter**: document resolution, schema repair, upload and download
//! - **scheduler**: background auto-sync loop with cancellation
//!
//! ## Sync Model
//!
//! Upload overwrites the whole remote document from a local snapshot;
//! fetch downloads the whole document and applies habit data locally in
//! the caller's chosen mode (replace or local-wins merge). There is no
//! per-cell reconciliation: the spreadsheet is a mirror and a backup, not
//! a CRDT.

pub mod adapter;
pub mod google;
pub mod rows;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
pub mod test_support;

pub use adapter::{SheetsSyncAdapter, SPREADSHEET_NAME};
pub use google::{GoogleAuthProvider, GoogleTabularStore};
pub use scheduler::{interval_from_minutes, SyncScheduler};
pub use traits::{AuthProvider, RangeUpdate, TabularStore};

use crate::storage::json::{JsonConnection, SettingsRepository};

/// The production adapter: Google auth and Sheets backed by the
/// connection's token cache and settings files
pub fn google_adapter(
    connection: &JsonConnection,
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
) -> SheetsSyncAdapter<GoogleAuthProvider, GoogleTabularStore, SettingsRepository> {
    SheetsSyncAdapter::new(
        GoogleAuthProvider::new(client_id, client_secret, connection.token_cache_path()),
        GoogleTabularStore::new(),
        SettingsRepository::new(connection.clone()),
    )
}
