//! Domain model types for the habit tracker.

pub mod habit;
pub mod market;
pub mod snapshot;

pub use habit::{Habit, HabitColor, HabitValidationError, SleepEntry};
pub use market::{
    AntiTodo, DailyTaskSet, EconomyRecord, ShopItem, ShopItemKind, ShopValidationError,
    TaskKind, TaskPriority, TaskProtocol, TaskValidationError, Ticket, Todo,
};
pub use snapshot::{ApplyMode, FlatSnapshot, MarketSnapshot, RemoteSnapshot};
