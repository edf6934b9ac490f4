use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority drives the completion reward. Unknown priority strings in
/// persisted data parse to `Low`, so a corrupted row still pays the lowest
/// reward instead of failing the load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl From<String> for TaskPriority {
    fn from(s: String) -> Self {
        TaskPriority::from_string(&s)
    }
}

impl From<TaskPriority> for String {
    fn from(priority: TaskPriority) -> Self {
        priority.to_string()
    }
}

impl TaskPriority {
    pub fn to_string(&self) -> String {
        match self {
            TaskPriority::High => "high".to_string(),
            TaskPriority::Medium => "medium".to_string(),
            TaskPriority::Low => "low".to_string(),
        }
    }

    /// Parse from a tag string; unknown tags fall back to `Low`
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "high" => TaskPriority::High,
            "medium" => TaskPriority::Medium,
            _ => TaskPriority::Low,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Discriminates the two task lists for operations that work on either.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Todo,
    Avoid,
}

impl TaskKind {
    pub fn to_string(&self) -> String {
        match self {
            TaskKind::Todo => "todo".to_string(),
            TaskKind::Avoid => "avoid".to_string(),
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskKind::Todo),
            "avoid" => Ok(TaskKind::Avoid),
            _ => Err(format!("Invalid task kind: {}", s)),
        }
    }
}

/// Shop item category. Only consumables exist today; the tag is kept so
/// the sheet schema and any future kinds stay readable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ShopItemKind {
    Consumable,
}

impl From<String> for ShopItemKind {
    fn from(s: String) -> Self {
        ShopItemKind::from_string(&s)
    }
}

impl From<ShopItemKind> for String {
    fn from(kind: ShopItemKind) -> Self {
        kind.to_string()
    }
}

impl ShopItemKind {
    pub fn to_string(&self) -> String {
        match self {
            ShopItemKind::Consumable => "consumable".to_string(),
        }
    }

    pub fn from_string(_s: &str) -> Self {
        ShopItemKind::Consumable
    }
}

impl Default for ShopItemKind {
    fn default() -> Self {
        ShopItemKind::Consumable
    }
}

/// A reward in the shop catalog. `desire_level` (1-10) rates how badly the
/// user wants it and inversely drives the lottery win weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub desire_level: i64,
    #[serde(rename = "type", default)]
    pub kind: ShopItemKind,
}

/// A won lottery reward sitting in the inventory. Name and desire level
/// are snapshots taken at win time so the ticket survives deletion of the
/// shop item it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub item_id: String,
    pub name: String,
    pub desire_level: i64,
    pub won_at: DateTime<Utc>,
    pub is_used: bool,
}

/// The singleton gamification economy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EconomyRecord {
    pub points: i64,
    #[serde(default)]
    pub inventory: Vec<Ticket>,
    pub streak: i64,
    pub rank: String,
}

impl EconomyRecord {
    pub const DEFAULT_RANK: &'static str = "Apprentice";
}

impl Default for EconomyRecord {
    fn default() -> Self {
        Self {
            points: 0,
            inventory: Vec::new(),
            streak: 0,
            rank: Self::DEFAULT_RANK.to_string(),
        }
    }
}

/// Implementation-intention fields attached to a todo ("when X, where Y").
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskProtocol {
    #[serde(default)]
    pub when: String,
    #[serde(rename = "where", default)]
    pub location: String,
}

/// A daily task. `completed` resets to false at the daily rollover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub priority: TaskPriority,
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub protocol: TaskProtocol,
    pub created_at: DateTime<Utc>,
}

/// A habit to avoid. Each failure event deducts `cost` points and bumps
/// `fail_count`; the count resets at the daily rollover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AntiTodo {
    pub id: String,
    pub title: String,
    pub cost: i64,
    #[serde(default)]
    pub notes: String,
    pub fail_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed_at: Option<DateTime<Utc>>,
}

impl AntiTodo {
    pub const DEFAULT_COST: i64 = 50;
}

/// The two day-scoped task lists, already rolled over for today.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTaskSet {
    pub todos: Vec<Todo>,
    pub not_todos: Vec<AntiTodo>,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskValidationError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
    #[error("Penalty cost must be positive")]
    NonPositiveCost,
}

#[derive(Debug, thiserror::Error)]
pub enum ShopValidationError {
    #[error("Item name cannot be empty")]
    EmptyName,
}
