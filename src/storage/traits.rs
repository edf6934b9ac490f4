//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.
//!
//! All operations are synchronous: the tracker's concurrency model keeps
//! local mutation on one thread and relies on no suspension point sitting
//! between a read and the write that follows it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::models::{
    ApplyMode, DailyTaskSet, EconomyRecord, FlatSnapshot, Habit, ShopItem, SleepEntry,
};

/// Trait defining the interface for habit record storage operations
///
/// This is the single source of truth for habits, per-month completion
/// maps, per-day sleep entries, goals and notes, persisted as one
/// versioned document.
pub trait HabitStorage: Send + Sync {
    /// Create an empty versioned document if none exists. Idempotent.
    fn initialize(&self) -> Result<()>;

    /// List all habits in creation order
    fn list_habits(&self) -> Result<Vec<Habit>>;

    /// Append a new habit
    fn store_habit(&self, habit: &Habit) -> Result<()>;

    /// Remove a habit from the list
    /// Returns true if the habit was found and deleted, false otherwise.
    /// Completion entries for the habit are left in place; orphans are
    /// tolerated, not an error.
    fn delete_habit(&self, habit_id: &str) -> Result<bool>;

    /// Flip the completion flag for `(habit_id, day_key)` and return the
    /// new value. The month record is created lazily; no entry counts as
    /// false. Safe to call for a habit id that is not in the habit list.
    fn toggle_completion(&self, habit_id: &str, day_key: &str) -> Result<bool>;

    /// Whether the habit is completed on the given day
    fn is_completed(&self, habit_id: &str, day_key: &str) -> Result<bool>;

    /// All completion entries recorded for a habit in a month
    fn get_month_completions(&self, habit_id: &str, month_key: &str) -> Result<BTreeMap<String, bool>>;

    /// Upsert the sleep entry for a day, overwriting any prior entry
    fn save_sleep(&self, day_key: &str, entry: &SleepEntry) -> Result<()>;

    /// Sleep entry for a day, if one was logged
    fn get_sleep(&self, day_key: &str) -> Result<Option<SleepEntry>>;

    /// All sleep entries recorded in a month
    fn get_month_sleep(&self, month_key: &str) -> Result<BTreeMap<String, SleepEntry>>;

    /// Replace the goal list for a month
    fn save_goals(&self, month_key: &str, goals: &[String]) -> Result<()>;

    /// Goal list for a month (empty if the month has no record)
    fn get_goals(&self, month_key: &str) -> Result<Vec<String>>;

    /// Replace the free-form notes for a month
    fn save_notes(&self, month_key: &str, notes: &str) -> Result<()>;

    /// Notes for a month (empty if the month has no record)
    fn get_notes(&self, month_key: &str) -> Result<String>;

    /// Timestamp of the last successful remote sync
    fn get_last_sync(&self) -> Result<Option<DateTime<Utc>>>;

    /// Record a successful remote sync
    fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()>;

    /// Serialize the full document for export
    fn export_snapshot(&self) -> Result<String>;

    /// Replace the full document from a serialized export.
    /// Malformed input fails with a parse error and leaves storage intact.
    fn import_snapshot(&self, serialized: &str) -> Result<()>;

    /// De-partition the month-based storage into flat maps for the remote
    /// adapter
    fn flatten_for_sync(&self) -> Result<FlatSnapshot>;

    /// Reconstruct month partitions from flat input. In `Replace` mode
    /// remote values win outright; in `Merge` mode existing local entries
    /// take precedence and remote only fills gaps.
    fn apply_flat_snapshot(&self, flat: &FlatSnapshot, mode: ApplyMode) -> Result<()>;
}

/// Trait defining the interface for market record storage operations
///
/// Covers the gamification economy, the shop catalog, and the day-scoped
/// task lists with their daily rollover rule.
pub trait MarketStorage: Send + Sync {
    /// Create an empty versioned document if none exists. Idempotent.
    fn initialize(&self) -> Result<()>;

    /// The economy record (zeroed defaults if absent)
    fn get_economy(&self) -> Result<EconomyRecord>;

    /// Persist the economy record
    fn save_economy(&self, economy: &EconomyRecord) -> Result<()>;

    /// The shop catalog (seeded with a small default catalog on first use)
    fn get_shop_items(&self) -> Result<Vec<ShopItem>>;

    /// Persist the shop catalog
    fn save_shop_items(&self, items: &[ShopItem]) -> Result<()>;

    /// The daily task lists, rolled over first if the stored reset marker
    /// is not today. Rollover lives here and only here, so it is correct
    /// even when the process was closed across midnight.
    fn get_daily_tasks(&self) -> Result<DailyTaskSet>;

    /// Persist the daily task lists
    fn save_daily_tasks(&self, tasks: &DailyTaskSet) -> Result<()>;
}

/// Trait defining the interface for storage connections
///
/// Abstracts the concrete storage backing and provides factory methods
/// for creating repositories, so the domain layer can work against any
/// backend without knowing the implementation details.
pub trait Connection: Send + Sync + Clone + 'static {
    /// The type of HabitStorage this connection creates
    type HabitRepository: HabitStorage + Clone;

    /// The type of MarketStorage this connection creates
    type MarketRepository: MarketStorage + Clone;

    /// Create a new habit repository for this connection
    fn create_habit_repository(&self) -> Self::HabitRepository;

    /// Create a new market repository for this connection
    fn create_market_repository(&self) -> Self::MarketRepository;
}
