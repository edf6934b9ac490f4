//! # JSON Storage Module
//!
//! This module provides a file-based storage implementation for the habit
//! tracker using human-readable JSON documents. Keeping the files readable
//! means a user can always inspect (or rescue) their data with a text editor.
//!
//! ## Files
//!
//! ```text
//! Habit Tracker/
//! ├── habit_data.json      ← habits, completions, sleep, goals, notes
//! ├── market_data.json     ← economy, shop catalog, daily tasks
//! ├── sync_settings.yaml   ← sync preferences
//! └── google_token.json    ← cached OAuth token (written by the sync layer)
//! ```
//!
//! ## Features
//!
//! - One versioned document per concern with a migration gate on load
//! - Atomic file writes (temp file + rename)
//! - Month-partitioned habit data so documents stay small to diff
//! - Compatible with the same storage traits as any future backend

pub mod connection;
pub mod habit_repository;
pub mod market_repository;
pub mod settings_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use habit_repository::{HabitDocument, HabitRepository, MonthRecord, STORAGE_VERSION};
pub use market_repository::{MarketDocument, MarketRepository, MARKET_VERSION};
pub use settings_repository::{SettingsRepository, SettingsStorage, SyncSettings};
