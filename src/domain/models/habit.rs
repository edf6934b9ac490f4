use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color tag assigned to a habit. The tag set is closed; anything else in
/// persisted data falls back to `Exercise`, matching the tracker's
/// historical default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum HabitColor {
    Move,
    Stand,
    Sleep,
    Exercise,
}

impl From<String> for HabitColor {
    fn from(s: String) -> Self {
        HabitColor::from_string(&s)
    }
}

impl From<HabitColor> for String {
    fn from(color: HabitColor) -> Self {
        color.to_string()
    }
}

impl HabitColor {
    /// Convert to the tag string used in sheet rows
    pub fn to_string(&self) -> String {
        match self {
            HabitColor::Move => "move".to_string(),
            HabitColor::Stand => "stand".to_string(),
            HabitColor::Sleep => "sleep".to_string(),
            HabitColor::Exercise => "exercise".to_string(),
        }
    }

    /// Parse from a tag string; unknown tags fall back to the default
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "move" => HabitColor::Move,
            "stand" => HabitColor::Stand,
            "sleep" => HabitColor::Sleep,
            _ => HabitColor::Exercise,
        }
    }
}

impl Default for HabitColor {
    fn default() -> Self {
        HabitColor::Exercise
    }
}

/// A tracked habit. Immutable after creation except for deletion;
/// completions reference it by id and survive its deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub category: String,
    pub color: HabitColor,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub const DEFAULT_ICON: &'static str = "✅";
    pub const DEFAULT_CATEGORY: &'static str = "Custom";

    pub fn generate_id(now_millis: u64) -> String {
        format!("habit-{}", now_millis)
    }
}

/// One sleep log for a calendar day. `time` keeps the raw `HH:mm` text the
/// user entered; statistics parse it leniently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SleepEntry {
    pub time: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HabitValidationError {
    #[error("Habit name cannot be empty")]
    EmptyName,
    #[error("Habit name is too long")]
    NameTooLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_color_round_trip() {
        for color in [
            HabitColor::Move,
            HabitColor::Stand,
            HabitColor::Sleep,
            HabitColor::Exercise,
        ] {
            assert_eq!(HabitColor::from_string(&color.to_string()), color);
        }
    }

    #[test]
    fn test_habit_color_unknown_falls_back() {
        assert_eq!(HabitColor::from_string("neon"), HabitColor::Exercise);
        assert_eq!(HabitColor::from_string(""), HabitColor::Exercise);
    }

    #[test]
    fn test_habit_color_serde_tolerates_unknown_tag() {
        let color: HabitColor = serde_json::from_str("\"move\"").unwrap();
        assert_eq!(color, HabitColor::Move);

        let unknown: HabitColor = serde_json::from_str("\"sparkle\"").unwrap();
        assert_eq!(unknown, HabitColor::Exercise);
    }

    #[test]
    fn test_habit_serializes_camel_case() {
        let habit = Habit {
            id: "habit-1".to_string(),
            name: "Read".to_string(),
            icon: Habit::DEFAULT_ICON.to_string(),
            category: Habit::DEFAULT_CATEGORY.to_string(),
            color: HabitColor::Exercise,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&habit).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"color\":\"exercise\""));
    }
}
