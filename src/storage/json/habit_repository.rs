//! # JSON Habit Repository
//!
//! File-based storage for habits, completions, sleep logs, goals and
//! notes, kept in a single versioned JSON document `habit_data.json` at
//! the root of the data directory.
//!
//! ## Document Format
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "lastSync": "2024-03-01T12:00:00Z",
//!   "months": {
//!     "2024-03": {
//!       "habits": { "habit-1": { "2024-03-01": true } },
//!       "sleep": { "2024-03-01": { "time": "23:30" } },
//!       "goals": ["Run a 10k"],
//!       "notes": ""
//!     }
//!   },
//!   "habits": [ { "id": "habit-1", "name": "Run", ... } ]
//! }
//! ```
//!
//! ## Invariants
//!
//! - A day key only ever appears under the month record whose key matches
//!   the day's calendar month
//! - Month records are created lazily on first write and never deleted
//! - Completion entries survive deletion of their habit (orphans are
//!   tolerated)
//! - Writes are atomic (temp file + rename), and nothing in memory moves
//!   past what was durably saved

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::connection::JsonConnection;
use crate::dates;
use crate::domain::models::{ApplyMode, FlatSnapshot, Habit, SleepEntry};
use crate::storage::traits::HabitStorage;

/// Schema version stamped into every habit document
pub const STORAGE_VERSION: &str = "1.0.0";

/// One calendar month's partition of the habit document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    /// habit id → day key → completed
    #[serde(default)]
    pub habits: BTreeMap<String, BTreeMap<String, bool>>,
    /// day key → sleep entry
    #[serde(default)]
    pub sleep: BTreeMap<String, SleepEntry>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// The versioned on-disk document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitDocument {
    pub version: String,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub months: BTreeMap<String, MonthRecord>,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

impl Default for HabitDocument {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION.to_string(),
            last_sync: None,
            months: BTreeMap::new(),
            habits: Vec::new(),
        }
    }
}

/// JSON-backed habit repository
#[derive(Clone)]
pub struct HabitRepository {
    connection: JsonConnection,
}

impl HabitRepository {
    /// Create a new habit repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    fn data_path(&self) -> PathBuf {
        self.connection.habit_data_path()
    }

    /// Load the document from disk, or an empty versioned one if the file
    /// does not exist yet
    fn load_document(&self) -> Result<HabitDocument> {
        let path = self.data_path();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let document: HabitDocument = serde_json::from_str(&content)?;
            debug!("Loaded habit document from {:?}", path);
            Self::migrate_document(document)
        } else {
            Ok(HabitDocument::default())
        }
    }

    /// Version gate for loaded documents. There is a single schema version
    /// today; anything else is a future (or corrupted) format we refuse to
    /// guess at.
    fn migrate_document(document: HabitDocument) -> Result<HabitDocument> {
        match document.version.as_str() {
            STORAGE_VERSION => Ok(document),
            other => Err(anyhow::anyhow!(
                "Unsupported habit data version '{}' (expected '{}')",
                other,
                STORAGE_VERSION
            )),
        }
    }

    /// Save the document atomically: write to a temp file, then rename
    fn save_document(&self, document: &HabitDocument) -> Result<()> {
        let path = self.data_path();
        let base_dir = self.connection.base_directory();

        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
            info!("Created base data directory: {:?}", base_dir);
        }

        let json_content = serde_json::to_string_pretty(document)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json_content)?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved habit document to {:?}", path);
        Ok(())
    }

    /// Month entry for a day key, created lazily. Fails on an unparseable
    /// day key so a bad key can never land in the wrong partition.
    fn month_for_day<'a>(
        document: &'a mut HabitDocument,
        day_key: &str,
    ) -> Result<&'a mut MonthRecord> {
        let month_key = dates::month_key_for_day(day_key)?;
        Ok(document.months.entry(month_key).or_default())
    }
}

impl HabitStorage for HabitRepository {
    fn initialize(&self) -> Result<()> {
        let path = self.data_path();
        if !path.exists() {
            self.save_document(&HabitDocument::default())?;
            info!("✅ Created empty habit document at {:?}", path);
        }
        Ok(())
    }

    fn list_habits(&self) -> Result<Vec<Habit>> {
        Ok(self.load_document()?.habits)
    }

    fn store_habit(&self, habit: &Habit) -> Result<()> {
        let mut document = self.load_document()?;
        document.habits.push(habit.clone());
        self.save_document(&document)?;
        info!("✅ Stored habit '{}' ({})", habit.name, habit.id);
        Ok(())
    }

    fn delete_habit(&self, habit_id: &str) -> Result<bool> {
        let mut document = self.load_document()?;
        let before = document.habits.len();
        document.habits.retain(|habit| habit.id != habit_id);

        if document.habits.len() == before {
            return Ok(false);
        }

        // Completion entries for the habit stay behind on purpose
        self.save_document(&document)?;
        info!("Deleted habit {}", habit_id);
        Ok(true)
    }

    fn toggle_completion(&self, habit_id: &str, day_key: &str) -> Result<bool> {
        let mut document = self.load_document()?;
        let month = Self::month_for_day(&mut document, day_key)?;

        let entries = month.habits.entry(habit_id.to_string()).or_default();
        let current = entries.get(day_key).copied().unwrap_or(false);
        let new_value = !current;
        entries.insert(day_key.to_string(), new_value);

        self.save_document(&document)?;
        debug!("Toggled {} on {} -> {}", habit_id, day_key, new_value);
        Ok(new_value)
    }

    fn is_completed(&self, habit_id: &str, day_key: &str) -> Result<bool> {
        let document = self.load_document()?;
        let month_key = dates::month_key_for_day(day_key)?;

        Ok(document
            .months
            .get(&month_key)
            .and_then(|month| month.habits.get(habit_id))
            .and_then(|entries| entries.get(day_key))
            .copied()
            .unwrap_or(false))
    }

    fn get_month_completions(&self, habit_id: &str, month_key: &str) -> Result<BTreeMap<String, bool>> {
        let document = self.load_document()?;
        Ok(document
            .months
            .get(month_key)
            .and_then(|month| month.habits.get(habit_id))
            .cloned()
            .unwrap_or_default())
    }

    fn save_sleep(&self, day_key: &str, entry: &SleepEntry) -> Result<()> {
        let mut document = self.load_document()?;
        let month = Self::month_for_day(&mut document, day_key)?;
        month.sleep.insert(day_key.to_string(), entry.clone());
        self.save_document(&document)
    }

    fn get_sleep(&self, day_key: &str) -> Result<Option<SleepEntry>> {
        let document = self.load_document()?;
        let month_key = dates::month_key_for_day(day_key)?;
        Ok(document
            .months
            .get(&month_key)
            .and_then(|month| month.sleep.get(day_key))
            .cloned())
    }

    fn get_month_sleep(&self, month_key: &str) -> Result<BTreeMap<String, SleepEntry>> {
        let document = self.load_document()?;
        Ok(document
            .months
            .get(month_key)
            .map(|month| month.sleep.clone())
            .unwrap_or_default())
    }

    fn save_goals(&self, month_key: &str, goals: &[String]) -> Result<()> {
        let mut document = self.load_document()?;
        let month = document.months.entry(month_key.to_string()).or_default();
        month.goals = goals.to_vec();
        self.save_document(&document)
    }

    fn get_goals(&self, month_key: &str) -> Result<Vec<String>> {
        let document = self.load_document()?;
        Ok(document
            .months
            .get(month_key)
            .map(|month| month.goals.clone())
            .unwrap_or_default())
    }

    fn save_notes(&self, month_key: &str, notes: &str) -> Result<()> {
        let mut document = self.load_document()?;
        let month = document.months.entry(month_key.to_string()).or_default();
        month.notes = notes.to_string();
        self.save_document(&document)
    }

    fn get_notes(&self, month_key: &str) -> Result<String> {
        let document = self.load_document()?;
        Ok(document
            .months
            .get(month_key)
            .map(|month| month.notes.clone())
            .unwrap_or_default())
    }

    fn get_last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load_document()?.last_sync)
    }

    fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        let mut document = self.load_document()?;
        document.last_sync = Some(at);
        self.save_document(&document)
    }

    fn export_snapshot(&self) -> Result<String> {
        let document = self.load_document()?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn import_snapshot(&self, serialized: &str) -> Result<()> {
        // Parse and version-check before anything touches disk
        let document: HabitDocument = serde_json::from_str(serialized)
            .map_err(|e| anyhow::anyhow!("Invalid import data: {}", e))?;
        let document = Self::migrate_document(document)?;

        self.save_document(&document)?;
        info!(
            "✅ Imported habit document: {} habits, {} months",
            document.habits.len(),
            document.months.len()
        );
        Ok(())
    }

    fn flatten_for_sync(&self) -> Result<FlatSnapshot> {
        let document = self.load_document()?;
        let mut flat = FlatSnapshot {
            habits: document.habits.clone(),
            ..Default::default()
        };

        for month in document.months.values() {
            for (habit_id, entries) in &month.habits {
                let days = flat.completions.entry(habit_id.clone()).or_default();
                for (day_key, completed) in entries {
                    days.insert(day_key.clone(), *completed);
                }
            }
            for (day_key, entry) in &month.sleep {
                flat.sleep_data.insert(day_key.clone(), entry.clone());
            }
        }

        Ok(flat)
    }

    fn apply_flat_snapshot(&self, flat: &FlatSnapshot, mode: ApplyMode) -> Result<()> {
        let mut document = self.load_document()?;

        match mode {
            ApplyMode::Replace => {
                let mut months: BTreeMap<String, MonthRecord> = BTreeMap::new();

                // Goals and notes never travel through the flat snapshot,
                // so a replace keeps the local ones
                for (month_key, record) in &document.months {
                    if !record.goals.is_empty() || !record.notes.is_empty() {
                        let month = months.entry(month_key.clone()).or_default();
                        month.goals = record.goals.clone();
                        month.notes = record.notes.clone();
                    }
                }

                for (habit_id, entries) in &flat.completions {
                    for (day_key, completed) in entries {
                        let month_key = match dates::month_key_for_day(day_key) {
                            Ok(key) => key,
                            Err(_) => {
                                warn!("⚠️ Skipping completion with invalid day key '{}'", day_key);
                                continue;
                            }
                        };
                        months
                            .entry(month_key)
                            .or_default()
                            .habits
                            .entry(habit_id.clone())
                            .or_default()
                            .insert(day_key.clone(), *completed);
                    }
                }

                for (day_key, entry) in &flat.sleep_data {
                    let month_key = match dates::month_key_for_day(day_key) {
                        Ok(key) => key,
                        Err(_) => {
                            warn!("⚠️ Skipping sleep entry with invalid day key '{}'", day_key);
                            continue;
                        }
                    };
                    months
                        .entry(month_key)
                        .or_default()
                        .sleep
                        .insert(day_key.clone(), entry.clone());
                }

                document.months = months;
                document.habits = flat.habits.clone();
            }
            ApplyMode::Merge => {
                // Local wins: remote values only fill gaps
                for habit in &flat.habits {
                    if !document.habits.iter().any(|h| h.id == habit.id) {
                        document.habits.push(habit.clone());
                    }
                }

                for (habit_id, entries) in &flat.completions {
                    for (day_key, completed) in entries {
                        let month_key = match dates::month_key_for_day(day_key) {
                            Ok(key) => key,
                            Err(_) => {
                                warn!("⚠️ Skipping completion with invalid day key '{}'", day_key);
                                continue;
                            }
                        };
                        document
                            .months
                            .entry(month_key)
                            .or_default()
                            .habits
                            .entry(habit_id.clone())
                            .or_default()
                            .entry(day_key.clone())
                            .or_insert(*completed);
                    }
                }

                for (day_key, entry) in &flat.sleep_data {
                    let month_key = match dates::month_key_for_day(day_key) {
                        Ok(key) => key,
                        Err(_) => {
                            warn!("⚠️ Skipping sleep entry with invalid day key '{}'", day_key);
                            continue;
                        }
                    };
                    document
                        .months
                        .entry(month_key)
                        .or_default()
                        .sleep
                        .entry(day_key.clone())
                        .or_insert_with(|| entry.clone());
                }
            }
        }

        self.save_document(&document)?;
        info!("✅ Applied flat snapshot ({:?} mode)", mode);
        Ok(())
    }
}
