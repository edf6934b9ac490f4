//! # Habit Service
//!
//! Core habit tracking operations and view state. The service owns a
//! small in-memory state (habit list, displayed month, sync flags) behind
//! an `Arc<Mutex<...>>` so it can be cloned into UI callbacks cheaply,
//! while every mutation goes through the repository first. State only
//! advances after a successful save, so the view can never show data that
//! was not durably written.
//!
//! All operations are synchronous except the two sync entry points, which
//! await the network adapter.

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::dates;
use crate::domain::commands::habits::{CreateHabitCommand, HabitStatsResult, SleepStatsResult};
use crate::domain::models::{ApplyMode, Habit, HabitValidationError, MarketSnapshot, RemoteSnapshot, SleepEntry};
use crate::storage::json::SettingsStorage;
use crate::storage::traits::{Connection, HabitStorage};
use crate::sync::adapter::SheetsSyncAdapter;
use crate::sync::traits::{AuthProvider, TabularStore};

/// Longest accepted habit name
pub const MAX_HABIT_NAME_LENGTH: usize = 256;

/// In-memory view state shared by service clones
#[derive(Debug, Clone)]
struct HabitViewState {
    habits: Vec<Habit>,
    /// First day of the month the UI is looking at
    current_month: NaiveDate,
    last_sync: Option<DateTime<Utc>>,
    is_loading: bool,
    is_syncing: bool,
}

impl Default for HabitViewState {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            habits: Vec::new(),
            current_month: today.with_day(1).unwrap_or(today),
            last_sync: None,
            is_loading: true,
            is_syncing: false,
        }
    }
}

/// Service for habit CRUD, completions, sleep logs and sync orchestration
#[derive(Clone)]
pub struct HabitService<C: Connection> {
    habit_repository: C::HabitRepository,
    state: Arc<Mutex<HabitViewState>>,
}

impl<C: Connection> HabitService<C> {
    /// Create a new habit service backed by the given connection
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            habit_repository: connection.create_habit_repository(),
            state: Arc::new(Mutex::new(HabitViewState::default())),
        }
    }

    /// Load persisted state into memory. Call once at startup.
    pub fn initialize(&self) -> Result<()> {
        self.habit_repository.initialize()?;

        let habits = self.habit_repository.list_habits()?;
        let last_sync = self.habit_repository.get_last_sync()?;

        let mut state = self.state.lock().unwrap();
        state.habits = habits;
        state.last_sync = last_sync;
        state.is_loading = false;

        info!("✅ Habit service initialized with {} habits", state.habits.len());
        Ok(())
    }

    // === View state accessors ===

    pub fn habits(&self) -> Vec<Habit> {
        self.state.lock().unwrap().habits.clone()
    }

    pub fn current_month(&self) -> NaiveDate {
        self.state.lock().unwrap().current_month
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().last_sync
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    pub fn is_syncing(&self) -> bool {
        self.state.lock().unwrap().is_syncing
    }

    // === Habit CRUD ===

    /// Create a habit, filling in defaults for anything the command left out
    pub fn add_habit(&self, command: CreateHabitCommand) -> Result<Habit> {
        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(HabitValidationError::EmptyName.into());
        }
        if name.chars().count() > MAX_HABIT_NAME_LENGTH {
            return Err(HabitValidationError::NameTooLong.into());
        }

        let habit = Habit {
            id: command
                .id
                .unwrap_or_else(|| Habit::generate_id(Utc::now().timestamp_millis() as u64)),
            name,
            icon: command.icon.unwrap_or_else(|| Habit::DEFAULT_ICON.to_string()),
            category: command
                .category
                .unwrap_or_else(|| Habit::DEFAULT_CATEGORY.to_string()),
            color: command.color.unwrap_or_default(),
            created_at: Utc::now(),
        };

        self.habit_repository.store_habit(&habit)?;
        self.state.lock().unwrap().habits.push(habit.clone());

        Ok(habit)
    }

    /// Delete a habit by id. Its completion history stays on disk.
    pub fn delete_habit(&self, habit_id: &str) -> Result<bool> {
        let deleted = self.habit_repository.delete_habit(habit_id)?;
        if deleted {
            let mut state = self.state.lock().unwrap();
            state.habits.retain(|habit| habit.id != habit_id);
        }
        Ok(deleted)
    }

    // === Completions ===

    /// Flip a habit's checkmark for a day (today when None) and return the
    /// new value
    pub fn toggle_habit(&self, habit_id: &str, day_key: Option<String>) -> Result<bool> {
        let day_key = day_key.unwrap_or_else(dates::today_key);
        self.habit_repository.toggle_completion(habit_id, &day_key)
    }

    pub fn is_habit_completed(&self, habit_id: &str, day_key: &str) -> Result<bool> {
        self.habit_repository.is_completed(habit_id, day_key)
    }

    /// Day key → completed map for one habit in one month, for grid views
    pub fn month_completions(
        &self,
        habit_id: &str,
        month: NaiveDate,
    ) -> Result<std::collections::BTreeMap<String, bool>> {
        self.habit_repository
            .get_month_completions(habit_id, &dates::month_key(month))
    }

    /// Per-month statistics for a habit. Streaks run over the recorded
    /// entries in day order; days without an entry do not break a run.
    pub fn get_habit_stats(&self, habit_id: &str, month: NaiveDate) -> Result<HabitStatsResult> {
        let entries = self
            .habit_repository
            .get_month_completions(habit_id, &dates::month_key(month))?;

        let total_days = entries.len() as u32;
        let completions = entries.values().filter(|done| **done).count() as u32;
        let percentage = if total_days == 0 {
            0
        } else {
            ((completions as f64 / total_days as f64) * 100.0).round() as u32
        };

        // Scan newest-first: the leading run of completed days is the
        // current streak, the longest run anywhere is the best
        let mut current_streak = 0u32;
        let mut best_streak = 0u32;
        let mut run = 0u32;
        let mut leading = true;
        for completed in entries.values().rev() {
            if *completed {
                run += 1;
                if leading {
                    current_streak = run;
                }
                best_streak = best_streak.max(run);
            } else {
                leading = false;
                run = 0;
            }
        }

        Ok(HabitStatsResult {
            completions,
            total_days,
            percentage,
            current_streak,
            best_streak,
        })
    }

    // === Month navigation ===

    /// Move the displayed month forward and return the new month
    pub fn next_month(&self) -> NaiveDate {
        let mut state = self.state.lock().unwrap();
        state.current_month = dates::shift_months(state.current_month, 1);
        debug!("🗓️ Switched to month {}", state.current_month);
        state.current_month
    }

    /// Move the displayed month back and return the new month
    pub fn previous_month(&self) -> NaiveDate {
        let mut state = self.state.lock().unwrap();
        state.current_month = dates::shift_months(state.current_month, -1);
        debug!("🗓️ Switched to month {}", state.current_month);
        state.current_month
    }

    // === Sleep ===

    /// Record a bedtime. With no explicit day the entry lands on the
    /// current sleep day, so a 01:30 log still counts for last night.
    /// The raw text is kept as entered.
    pub fn save_sleep(&self, day_key: Option<String>, time: &str) -> Result<()> {
        let day_key = day_key.unwrap_or_else(|| {
            dates::sleep_day_key(Local::now(), dates::DEFAULT_SLEEP_CUTOFF_HOUR)
        });
        self.habit_repository
            .save_sleep(&day_key, &SleepEntry { time: time.to_string() })
    }

    pub fn get_sleep(&self, day_key: &str) -> Result<Option<SleepEntry>> {
        self.habit_repository.get_sleep(day_key)
    }

    /// Sleep summary for a month. Entries that don't parse as `HH:MM` are
    /// counted but excluded from the average.
    pub fn get_sleep_stats(&self, month: NaiveDate) -> Result<SleepStatsResult> {
        let entries = self.habit_repository.get_month_sleep(&dates::month_key(month))?;

        let parsed: Vec<f64> = entries
            .values()
            .filter_map(|entry| dates::parse_time_to_hours(&entry.time))
            .collect();

        let average_time = if parsed.is_empty() {
            "--:--".to_string()
        } else {
            dates::format_hours_to_time(parsed.iter().sum::<f64>() / parsed.len() as f64)
        };

        Ok(SleepStatsResult {
            average_time,
            total: entries.len(),
        })
    }

    // === Monthly goals and notes ===

    pub fn get_goals(&self, month: NaiveDate) -> Result<Vec<String>> {
        self.habit_repository.get_goals(&dates::month_key(month))
    }

    pub fn save_goals(&self, month: NaiveDate, goals: &[String]) -> Result<()> {
        self.habit_repository.save_goals(&dates::month_key(month), goals)
    }

    pub fn get_notes(&self, month: NaiveDate) -> Result<String> {
        self.habit_repository.get_notes(&dates::month_key(month))
    }

    pub fn save_notes(&self, month: NaiveDate, notes: &str) -> Result<()> {
        self.habit_repository.save_notes(&dates::month_key(month), notes)
    }

    // === Backup ===

    /// The full habit document as pretty JSON
    pub fn export_data(&self) -> Result<String> {
        self.habit_repository.export_snapshot()
    }

    /// Replace the habit document with previously exported JSON, then
    /// reload the in-memory state from it
    pub fn import_data(&self, serialized: &str) -> Result<()> {
        self.habit_repository.import_snapshot(serialized)?;

        let habits = self.habit_repository.list_habits()?;
        let last_sync = self.habit_repository.get_last_sync()?;
        let mut state = self.state.lock().unwrap();
        state.habits = habits;
        state.last_sync = last_sync;

        Ok(())
    }

    /// Write a backup file and return its path. With no target the file
    /// lands in the user's Documents folder (home directory as fallback),
    /// named `habit-tracker-backup-YYYY-MM-DD.json`.
    pub fn export_to_file(&self, target: Option<PathBuf>) -> Result<PathBuf> {
        let path = match target {
            Some(path) => path,
            None => {
                let directory = dirs::document_dir()
                    .or_else(dirs::home_dir)
                    .ok_or_else(|| anyhow::anyhow!("Could not determine an export directory"))?;
                directory.join(format!("habit-tracker-backup-{}.json", dates::today_key()))
            }
        };

        let json_content = self.habit_repository.export_snapshot()?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, json_content)?;

        info!("✅ EXPORT: Wrote backup to {:?}", path);
        Ok(path)
    }

    // === Remote sync ===

    /// Upload everything to the remote spreadsheet. The market snapshot
    /// travels along so habit and market data land in one document.
    /// Fails fast if another sync is already running.
    pub async fn sync_to_remote<A, T, S>(
        &self,
        adapter: &SheetsSyncAdapter<A, T, S>,
        market: MarketSnapshot,
    ) -> Result<()>
    where
        A: AuthProvider,
        T: TabularStore,
        S: SettingsStorage,
    {
        self.begin_sync()?;
        let result = self.run_upload(adapter, market).await;
        self.end_sync();
        result
    }

    /// Download the remote snapshot and apply its habit data locally.
    /// The market payload is returned to the caller, who decides whether
    /// to apply it.
    pub async fn fetch_from_remote<A, T, S>(
        &self,
        adapter: &SheetsSyncAdapter<A, T, S>,
        mode: ApplyMode,
    ) -> Result<MarketSnapshot>
    where
        A: AuthProvider,
        T: TabularStore,
        S: SettingsStorage,
    {
        self.begin_sync()?;
        let result = self.run_download(adapter, mode).await;
        self.end_sync();
        result
    }

    fn begin_sync(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.is_syncing {
            return Err(anyhow::anyhow!("Sync already in progress"));
        }
        state.is_syncing = true;
        Ok(())
    }

    fn end_sync(&self) {
        self.state.lock().unwrap().is_syncing = false;
    }

    async fn run_upload<A, T, S>(
        &self,
        adapter: &SheetsSyncAdapter<A, T, S>,
        market: MarketSnapshot,
    ) -> Result<()>
    where
        A: AuthProvider,
        T: TabularStore,
        S: SettingsStorage,
    {
        let flat = self.habit_repository.flatten_for_sync()?;
        let snapshot = RemoteSnapshot { flat, market };

        adapter.upload(&snapshot).await?;

        let now = Utc::now();
        self.habit_repository.set_last_sync(now)?;
        self.state.lock().unwrap().last_sync = Some(now);

        info!("✅ SYNC: Upload complete at {}", now.to_rfc3339());
        Ok(())
    }

    async fn run_download<A, T, S>(
        &self,
        adapter: &SheetsSyncAdapter<A, T, S>,
        mode: ApplyMode,
    ) -> Result<MarketSnapshot>
    where
        A: AuthProvider,
        T: TabularStore,
        S: SettingsStorage,
    {
        let snapshot = adapter.download().await?;
        self.habit_repository.apply_flat_snapshot(&snapshot.flat, mode)?;

        let now = Utc::now();
        self.habit_repository.set_last_sync(now)?;

        let habits = self.habit_repository.list_habits()?;
        {
            let mut state = self.state.lock().unwrap();
            state.habits = habits;
            state.last_sync = Some(now);
        }

        info!("✅ SYNC: Fetch complete at {}", now.to_rfc3339());
        Ok(snapshot.market)
    }
}
