//! # JSON Market Repository
//!
//! File-based storage for the points economy, shop catalog and daily
//! task lists, kept in a single versioned JSON document
//! `market_data.json` next to the habit document.
//!
//! The daily rollover lives here: `get_daily_tasks` compares the stored
//! reset marker against today's day key and, when a new day has started,
//! un-completes every todo and zeroes every anti-todo fail count before
//! returning. Callers never see yesterday's checkmarks.

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::connection::JsonConnection;
use crate::dates;
use crate::domain::models::{AntiTodo, DailyTaskSet, EconomyRecord, ShopItem, ShopItemKind, Todo};
use crate::storage::traits::MarketStorage;

/// Schema version stamped into every market document
pub const MARKET_VERSION: &str = "1.0.0";

/// Daily task lists plus the day key of their last reset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTasksRecord {
    pub last_reset: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub not_todos: Vec<AntiTodo>,
}

impl Default for DailyTasksRecord {
    fn default() -> Self {
        Self {
            last_reset: dates::today_key(),
            todos: Vec::new(),
            not_todos: Vec::new(),
        }
    }
}

/// The versioned on-disk document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketDocument {
    pub version: String,
    #[serde(default)]
    pub economy: EconomyRecord,
    #[serde(default = "default_shop_catalog")]
    pub shop_items: Vec<ShopItem>,
    #[serde(default)]
    pub daily_tasks: DailyTasksRecord,
}

impl Default for MarketDocument {
    fn default() -> Self {
        Self {
            version: MARKET_VERSION.to_string(),
            economy: EconomyRecord::default(),
            shop_items: default_shop_catalog(),
            daily_tasks: DailyTasksRecord::default(),
        }
    }
}

/// Starter catalog for a fresh install, so the first lottery draw has
/// something to win
fn default_shop_catalog() -> Vec<ShopItem> {
    vec![
        ShopItem {
            id: "1".to_string(),
            name: "15 Min Social Media".to_string(),
            desire_level: 3,
            kind: ShopItemKind::Consumable,
        },
        ShopItem {
            id: "2".to_string(),
            name: "Watch 1 Movie".to_string(),
            desire_level: 9,
            kind: ShopItemKind::Consumable,
        },
        ShopItem {
            id: "3".to_string(),
            name: "Buy Fast Food".to_string(),
            desire_level: 7,
            kind: ShopItemKind::Consumable,
        },
    ]
}

/// JSON-backed market repository
#[derive(Clone)]
pub struct MarketRepository {
    connection: JsonConnection,
}

impl MarketRepository {
    /// Create a new market repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    fn data_path(&self) -> PathBuf {
        self.connection.market_data_path()
    }

    fn load_document(&self) -> Result<MarketDocument> {
        let path = self.data_path();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let document: MarketDocument = serde_json::from_str(&content)?;
            Self::migrate_document(document)
        } else {
            Ok(MarketDocument::default())
        }
    }

    fn migrate_document(document: MarketDocument) -> Result<MarketDocument> {
        match document.version.as_str() {
            MARKET_VERSION => Ok(document),
            other => Err(anyhow::anyhow!(
                "Unsupported market data version '{}' (expected '{}')",
                other,
                MARKET_VERSION
            )),
        }
    }

    fn save_document(&self, document: &MarketDocument) -> Result<()> {
        let path = self.data_path();
        let base_dir = self.connection.base_directory();

        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
        }

        let json_content = serde_json::to_string_pretty(document)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json_content)?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved market document to {:?}", path);
        Ok(())
    }

    /// Reset daily state in place if the stored marker is from a previous
    /// day. Returns true when a reset happened.
    fn roll_over_if_stale(document: &mut MarketDocument) -> bool {
        let today = dates::today_key();
        if document.daily_tasks.last_reset == today {
            return false;
        }

        for todo in &mut document.daily_tasks.todos {
            todo.completed = false;
        }
        for anti in &mut document.daily_tasks.not_todos {
            anti.fail_count = 0;
        }
        document.daily_tasks.last_reset = today;
        true
    }
}

impl MarketStorage for MarketRepository {
    fn initialize(&self) -> Result<()> {
        let path = self.data_path();
        if !path.exists() {
            let document = MarketDocument::default();
            self.save_document(&document)?;
            info!(
                "✅ Created market document with {} starter shop items",
                document.shop_items.len()
            );
        }
        Ok(())
    }

    fn get_economy(&self) -> Result<EconomyRecord> {
        Ok(self.load_document()?.economy)
    }

    fn save_economy(&self, economy: &EconomyRecord) -> Result<()> {
        let mut document = self.load_document()?;
        document.economy = economy.clone();
        self.save_document(&document)
    }

    fn get_shop_items(&self) -> Result<Vec<ShopItem>> {
        Ok(self.load_document()?.shop_items)
    }

    fn save_shop_items(&self, items: &[ShopItem]) -> Result<()> {
        let mut document = self.load_document()?;
        document.shop_items = items.to_vec();
        self.save_document(&document)
    }

    fn get_daily_tasks(&self) -> Result<DailyTaskSet> {
        let mut document = self.load_document()?;

        if Self::roll_over_if_stale(&mut document) {
            self.save_document(&document)?;
            info!(
                "🔄 Daily task rollover: reset {} todos and {} anti-todos for {}",
                document.daily_tasks.todos.len(),
                document.daily_tasks.not_todos.len(),
                document.daily_tasks.last_reset
            );
        }

        Ok(DailyTaskSet {
            todos: document.daily_tasks.todos,
            not_todos: document.daily_tasks.not_todos,
        })
    }

    fn save_daily_tasks(&self, tasks: &DailyTaskSet) -> Result<()> {
        let mut document = self.load_document()?;
        document.daily_tasks.todos = tasks.todos.clone();
        document.daily_tasks.not_todos = tasks.not_todos.clone();
        self.save_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskPriority;
    use chrono::Utc;
    use tempfile::TempDir;

    fn setup_test_repo() -> (MarketRepository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = JsonConnection::new(temp_dir.path()).expect("Failed to create connection");
        (MarketRepository::new(connection), temp_dir)
    }

    fn test_todo(id: &str, completed: bool) -> Todo {
        Todo {
            id: id.to_string(),
            title: format!("Task {}", id),
            priority: TaskPriority::Medium,
            completed,
            notes: String::new(),
            protocol: Default::default(),
            created_at: Utc::now(),
        }
    }

    fn test_anti_todo(id: &str, fail_count: u32) -> AntiTodo {
        AntiTodo {
            id: id.to_string(),
            title: format!("Avoid {}", id),
            cost: AntiTodo::DEFAULT_COST,
            notes: String::new(),
            fail_count,
            last_failed_at: None,
        }
    }

    #[test]
    fn test_fresh_document_seeds_starter_catalog() {
        let (repo, _temp_dir) = setup_test_repo();

        let items = repo.get_shop_items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "15 Min Social Media");
        assert_eq!(items[1].desire_level, 9);
    }

    #[test]
    fn test_fresh_economy_defaults() {
        let (repo, _temp_dir) = setup_test_repo();

        let economy = repo.get_economy().unwrap();
        assert_eq!(economy.points, 0);
        assert_eq!(economy.streak, 0);
        assert_eq!(economy.rank, EconomyRecord::DEFAULT_RANK);
        assert!(economy.inventory.is_empty());
    }

    #[test]
    fn test_economy_round_trip() {
        let (repo, _temp_dir) = setup_test_repo();

        let mut economy = repo.get_economy().unwrap();
        economy.points = 250;
        economy.streak = 4;
        repo.save_economy(&economy).unwrap();

        let reloaded = repo.get_economy().unwrap();
        assert_eq!(reloaded.points, 250);
        assert_eq!(reloaded.streak, 4);
    }

    #[test]
    fn test_saving_shop_items_replaces_catalog() {
        let (repo, _temp_dir) = setup_test_repo();

        repo.save_shop_items(&[]).unwrap();
        assert!(repo.get_shop_items().unwrap().is_empty());

        // An emptied catalog must not get re-seeded on reload
        assert!(repo.get_shop_items().unwrap().is_empty());
    }

    #[test]
    fn test_same_day_read_does_not_reset() {
        let (repo, _temp_dir) = setup_test_repo();

        let tasks = DailyTaskSet {
            todos: vec![test_todo("t1", true)],
            not_todos: vec![test_anti_todo("a1", 2)],
        };
        repo.save_daily_tasks(&tasks).unwrap();

        let loaded = repo.get_daily_tasks().unwrap();
        assert!(loaded.todos[0].completed);
        assert_eq!(loaded.not_todos[0].fail_count, 2);
    }

    #[test]
    fn test_rollover_resets_completions_and_fail_counts() {
        let (repo, _temp_dir) = setup_test_repo();

        // Write a document whose reset marker is from a past day
        let mut document = MarketDocument::default();
        document.daily_tasks.last_reset = "2024-01-01".to_string();
        document.daily_tasks.todos = vec![test_todo("t1", true), test_todo("t2", false)];
        document.daily_tasks.not_todos = vec![test_anti_todo("a1", 3)];
        repo.save_document(&document).unwrap();

        let tasks = repo.get_daily_tasks().unwrap();
        assert!(!tasks.todos[0].completed);
        assert!(!tasks.todos[1].completed);
        assert_eq!(tasks.not_todos[0].fail_count, 0);

        // The marker advanced, so a second read changes nothing
        let reloaded = repo.load_document().unwrap();
        assert_eq!(reloaded.daily_tasks.last_reset, dates::today_key());
    }

    #[test]
    fn test_rollover_keeps_task_identity() {
        let (repo, _temp_dir) = setup_test_repo();

        let mut document = MarketDocument::default();
        document.daily_tasks.last_reset = "2024-01-01".to_string();
        document.daily_tasks.todos = vec![test_todo("t1", true)];
        repo.save_document(&document).unwrap();

        let tasks = repo.get_daily_tasks().unwrap();
        // Reset clears the checkmark, never the task itself
        assert_eq!(tasks.todos.len(), 1);
        assert_eq!(tasks.todos[0].id, "t1");
        assert_eq!(tasks.todos[0].title, "Task t1");
    }

    #[test]
    fn test_save_daily_tasks_preserves_reset_marker() {
        let (repo, _temp_dir) = setup_test_repo();

        repo.get_daily_tasks().unwrap();
        let before = repo.load_document().unwrap().daily_tasks.last_reset;

        repo.save_daily_tasks(&DailyTaskSet {
            todos: vec![test_todo("t1", false)],
            not_todos: vec![],
        })
        .unwrap();

        let after = repo.load_document().unwrap().daily_tasks.last_reset;
        assert_eq!(before, after);
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let (repo, temp_dir) = setup_test_repo();

        let raw = r#"{"version": "2.0.0", "economy": {"points": 1, "streak": 0, "rank": "X"}}"#;
        std::fs::write(temp_dir.path().join("market_data.json"), raw).unwrap();

        assert!(repo.get_economy().is_err());
    }
}
