//! Domain-level command and result types
//!
//! These structs are used by services inside the domain layer and are **not**
//! a public wire format. A UI layer maps its own input forms to these internal
//! types before calling the services.

pub mod habits {
    use crate::domain::models::HabitColor;

    /// Input for creating a new habit.
    #[derive(Debug, Clone)]
    pub struct CreateHabitCommand {
        /// Explicit id (tests and imports); generated when None
        pub id: Option<String>,
        pub name: String,
        pub icon: Option<String>,
        pub category: Option<String>,
        pub color: Option<HabitColor>,
    }

    impl CreateHabitCommand {
        /// Command with just a name and all defaults
        pub fn named(name: impl Into<String>) -> Self {
            Self {
                id: None,
                name: name.into(),
                icon: None,
                category: None,
                color: None,
            }
        }
    }

    /// Per-month statistics for a single habit.
    #[derive(Debug, Clone, PartialEq)]
    pub struct HabitStatsResult {
        /// Days marked complete in the month
        pub completions: u32,
        /// Days with any recorded entry in the month
        pub total_days: u32,
        /// completions / total_days, rounded to whole percent (0 when empty)
        pub percentage: u32,
        /// Run of consecutive completed days ending at the latest entry
        pub current_streak: u32,
        /// Longest run of consecutive completed days in the month
        pub best_streak: u32,
    }

    /// Sleep summary for a month.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SleepStatsResult {
        /// Average bedtime as "HH:MM", or "--:--" when nothing parseable
        pub average_time: String,
        /// Number of recorded sleep entries in the month
        pub total: usize,
    }
}

pub mod tasks {
    use crate::domain::models::{TaskPriority, TaskProtocol};

    /// Input for creating a new daily todo.
    #[derive(Debug, Clone)]
    pub struct CreateTodoCommand {
        pub title: String,
        /// Defaults to Medium
        pub priority: Option<TaskPriority>,
        pub notes: Option<String>,
        pub protocol: Option<TaskProtocol>,
    }

    /// Input for creating a new anti-todo.
    #[derive(Debug, Clone)]
    pub struct CreateAntiTodoCommand {
        pub title: String,
        /// Points lost per failure; defaults to 50 and must be positive
        pub cost: Option<i64>,
        pub notes: Option<String>,
    }
}

pub mod shop {
    use crate::domain::models::{ShopItem, Ticket};

    /// Input for adding an item to the shop catalog.
    #[derive(Debug, Clone)]
    pub struct AddShopItemCommand {
        pub name: String,
        /// Defaults to 5; higher desire means rarer in the lottery
        pub desire_level: Option<i64>,
    }

    /// Outcome of a lottery purchase attempt.
    #[derive(Debug, Clone)]
    pub enum LotteryOutcome {
        /// Points were spent and a prize landed in the inventory
        Won { item: ShopItem, ticket: Ticket },
        /// Catalog has no items to draw from; nothing was charged
        ShopEmpty,
        /// Balance below the ticket cost; nothing was charged
        InsufficientPoints { points: i64, cost: i64 },
    }

    impl LotteryOutcome {
        /// User-facing message for non-winning outcomes
        pub fn message(&self) -> String {
            match self {
                LotteryOutcome::Won { item, .. } => format!("You won: {}!", item.name),
                LotteryOutcome::ShopEmpty => "Shop is empty! Add items in Admin.".to_string(),
                LotteryOutcome::InsufficientPoints { .. } => "Not enough credits!".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::shop::LotteryOutcome;

    #[test]
    fn test_lottery_outcome_messages() {
        assert_eq!(
            LotteryOutcome::ShopEmpty.message(),
            "Shop is empty! Add items in Admin."
        );
        assert_eq!(
            LotteryOutcome::InsufficientPoints { points: 30, cost: 100 }.message(),
            "Not enough credits!"
        );
    }
}
