//! # Sheet Row Codec
//!
//! The fixed tab layout of the remote spreadsheet and the conversions
//! between domain types and rows of cell strings.
//!
//! ## Tab Layout
//!
//! | Tab         | Columns | Header                                        |
//! |-------------|---------|-----------------------------------------------|
//! | Habits      | A:F     | ID, Name, Icon, Category, Color, Created At   |
//! | Completions | A:C     | Habit ID, Date, Completed                     |
//! | SleepData   | A:B     | Date, Time                                    |
//! | Economy     | A:B     | Key, Value (rows: Points, Streak, Rank)       |
//! | Inventory   | A:E     | Ticket ID, Item Name, Won At, Is Used, Item ID|
//! | ShopItems   | A:E     | Item ID, Name, Desire Level, Type, Cost       |
//!
//! Booleans are written as `TRUE`/`FALSE` and read case-insensitively.
//! Decoding is tolerant: rows with a blank key column are skipped, short
//! rows read as empty cells, and unparseable values fall back to defaults
//! rather than failing the whole download.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::models::{
    EconomyRecord, FlatSnapshot, Habit, HabitColor, MarketSnapshot, RemoteSnapshot, ShopItem,
    ShopItemKind, SleepEntry, Ticket,
};
use crate::sync::traits::RangeUpdate;

pub const HABITS_TAB: &str = "Habits";
pub const COMPLETIONS_TAB: &str = "Completions";
pub const SLEEP_TAB: &str = "SleepData";
pub const ECONOMY_TAB: &str = "Economy";
pub const INVENTORY_TAB: &str = "Inventory";
pub const SHOP_TAB: &str = "ShopItems";

/// Every tab the document schema requires, in layout order
pub const SHEET_TABS: [&str; 6] = [
    HABITS_TAB,
    COMPLETIONS_TAB,
    SLEEP_TAB,
    ECONOMY_TAB,
    INVENTORY_TAB,
    SHOP_TAB,
];

fn last_column(tab: &str) -> &'static str {
    match tab {
        HABITS_TAB => "F",
        COMPLETIONS_TAB => "C",
        SLEEP_TAB | ECONOMY_TAB => "B",
        _ => "E",
    }
}

fn headers(tab: &str) -> &'static [&'static str] {
    match tab {
        HABITS_TAB => &["ID", "Name", "Icon", "Category", "Color", "Created At"],
        COMPLETIONS_TAB => &["Habit ID", "Date", "Completed"],
        SLEEP_TAB => &["Date", "Time"],
        ECONOMY_TAB => &["Key", "Value"],
        INVENTORY_TAB => &["Ticket ID", "Item Name", "Won At", "Is Used", "Item ID"],
        _ => &["Item ID", "Name", "Desire Level", "Type", "Cost"],
    }
}

/// Header row range for a tab, e.g. `Habits!A1:F1`
pub fn header_range(tab: &str) -> String {
    format!("{}!A1:{}1", tab, last_column(tab))
}

/// Open-ended data range below the header, e.g. `Habits!A2:F`
pub fn data_range(tab: &str) -> String {
    format!("{}!A2:{}", tab, last_column(tab))
}

/// Anchor cell data writes start at, e.g. `Habits!A2`
pub fn data_start(tab: &str) -> String {
    format!("{}!A2", tab)
}

/// Data ranges of all tabs, used both for clearing and for reading
pub fn data_ranges() -> Vec<String> {
    SHEET_TABS.iter().map(|tab| data_range(tab)).collect()
}

/// Header write for one tab
pub fn header_update(tab: &str) -> RangeUpdate {
    RangeUpdate::new(
        header_range(tab),
        vec![headers(tab).iter().map(|h| h.to_string()).collect()],
    )
}

/// Header writes for every tab
pub fn header_updates() -> Vec<RangeUpdate> {
    SHEET_TABS.iter().map(|tab| header_update(tab)).collect()
}

fn encode_bool(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

fn decode_bool(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true")
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).cloned().unwrap_or_default()
}

fn decode_timestamp(cell: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(cell)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// === Encoding ===

pub fn habits_to_rows(habits: &[Habit]) -> Vec<Vec<String>> {
    habits
        .iter()
        .map(|habit| {
            vec![
                habit.id.clone(),
                habit.name.clone(),
                habit.icon.clone(),
                habit.category.clone(),
                habit.color.to_string(),
                habit.created_at.to_rfc3339(),
            ]
        })
        .collect()
}

pub fn completions_to_rows(
    completions: &BTreeMap<String, BTreeMap<String, bool>>,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for (habit_id, days) in completions {
        for (day_key, completed) in days {
            rows.push(vec![
                habit_id.clone(),
                day_key.clone(),
                encode_bool(*completed),
            ]);
        }
    }
    rows
}

pub fn sleep_to_rows(sleep_data: &BTreeMap<String, SleepEntry>) -> Vec<Vec<String>> {
    sleep_data
        .iter()
        .map(|(day_key, entry)| vec![day_key.clone(), entry.time.clone()])
        .collect()
}

pub fn economy_to_rows(market: &MarketSnapshot) -> Vec<Vec<String>> {
    vec![
        vec!["Points".to_string(), market.points.to_string()],
        vec!["Streak".to_string(), market.streak.to_string()],
        vec!["Rank".to_string(), market.rank.clone()],
    ]
}

pub fn inventory_to_rows(inventory: &[Ticket]) -> Vec<Vec<String>> {
    inventory
        .iter()
        .map(|ticket| {
            vec![
                ticket.id.clone(),
                ticket.name.clone(),
                ticket.won_at.to_rfc3339(),
                encode_bool(ticket.is_used),
                ticket.item_id.clone(),
            ]
        })
        .collect()
}

pub fn shop_items_to_rows(items: &[ShopItem]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|item| {
            vec![
                item.id.clone(),
                item.name.clone(),
                item.desire_level.to_string(),
                item.kind.to_string(),
                // Cost column kept for the sheet layout; unused today
                String::new(),
            ]
        })
        .collect()
}

/// All data writes for one snapshot. Tabs with no rows are omitted; the
/// preceding clear already emptied them.
pub fn snapshot_updates(snapshot: &RemoteSnapshot) -> Vec<RangeUpdate> {
    let blocks = [
        (HABITS_TAB, habits_to_rows(&snapshot.flat.habits)),
        (COMPLETIONS_TAB, completions_to_rows(&snapshot.flat.completions)),
        (SLEEP_TAB, sleep_to_rows(&snapshot.flat.sleep_data)),
        (ECONOMY_TAB, economy_to_rows(&snapshot.market)),
        (INVENTORY_TAB, inventory_to_rows(&snapshot.market.inventory)),
        (SHOP_TAB, shop_items_to_rows(&snapshot.market.shop_items)),
    ];

    blocks
        .into_iter()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(tab, rows)| RangeUpdate::new(data_start(tab), rows))
        .collect()
}

// === Decoding ===

pub fn rows_to_habits(rows: &[Vec<String>]) -> Vec<Habit> {
    rows.iter()
        .filter(|row| !cell(row, 0).is_empty())
        .map(|row| Habit {
            id: cell(row, 0),
            name: cell(row, 1),
            icon: cell(row, 2),
            category: cell(row, 3),
            color: HabitColor::from_string(&cell(row, 4)),
            created_at: decode_timestamp(&cell(row, 5)),
        })
        .collect()
}

pub fn rows_to_completions(rows: &[Vec<String>]) -> BTreeMap<String, BTreeMap<String, bool>> {
    let mut completions: BTreeMap<String, BTreeMap<String, bool>> = BTreeMap::new();
    for row in rows {
        let habit_id = cell(row, 0);
        let day_key = cell(row, 1);
        if habit_id.is_empty() || day_key.is_empty() {
            continue;
        }
        completions
            .entry(habit_id)
            .or_default()
            .insert(day_key, decode_bool(&cell(row, 2)));
    }
    completions
}

pub fn rows_to_sleep(rows: &[Vec<String>]) -> BTreeMap<String, SleepEntry> {
    let mut sleep_data = BTreeMap::new();
    for row in rows {
        let day_key = cell(row, 0);
        if day_key.is_empty() {
            continue;
        }
        sleep_data.insert(day_key, SleepEntry { time: cell(row, 1) });
    }
    sleep_data
}

/// Points, streak and rank from the Economy key/value rows
pub fn rows_to_economy(rows: &[Vec<String>]) -> (i64, i64, String) {
    let mut points = 0;
    let mut streak = 0;
    let mut rank = EconomyRecord::DEFAULT_RANK.to_string();

    for row in rows {
        let value = cell(row, 1);
        match cell(row, 0).as_str() {
            "Points" => points = value.parse().unwrap_or(0),
            "Streak" => streak = value.parse().unwrap_or(0),
            "Rank" => {
                if !value.is_empty() {
                    rank = value;
                }
            }
            _ => {}
        }
    }

    (points, streak, rank)
}

pub fn rows_to_inventory(rows: &[Vec<String>]) -> Vec<Ticket> {
    rows.iter()
        .filter(|row| !cell(row, 0).is_empty())
        .map(|row| Ticket {
            id: cell(row, 0),
            name: cell(row, 1),
            won_at: decode_timestamp(&cell(row, 2)),
            is_used: decode_bool(&cell(row, 3)),
            item_id: cell(row, 4),
            // Desire level is not on the Inventory tab
            desire_level: 0,
        })
        .collect()
}

pub fn rows_to_shop_items(rows: &[Vec<String>]) -> Vec<ShopItem> {
    rows.iter()
        .filter(|row| !cell(row, 0).is_empty())
        .map(|row| ShopItem {
            id: cell(row, 0),
            name: cell(row, 1),
            desire_level: cell(row, 2).parse().unwrap_or(5),
            kind: ShopItemKind::from_string(&cell(row, 3)),
        })
        .collect()
}

/// Assemble a snapshot from the tables read back in `data_ranges()` order
pub fn snapshot_from_tables(tables: &[Vec<Vec<String>>]) -> RemoteSnapshot {
    let empty = Vec::new();
    let table = |index: usize| tables.get(index).unwrap_or(&empty);

    let (points, streak, rank) = rows_to_economy(table(3));

    RemoteSnapshot {
        flat: FlatSnapshot {
            habits: rows_to_habits(table(0)),
            completions: rows_to_completions(table(1)),
            sleep_data: rows_to_sleep(table(2)),
        },
        market: MarketSnapshot {
            points,
            streak,
            rank,
            inventory: rows_to_inventory(table(4)),
            shop_items: rows_to_shop_items(table(5)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_ranges_match_tab_layout() {
        assert_eq!(header_range(HABITS_TAB), "Habits!A1:F1");
        assert_eq!(data_range(HABITS_TAB), "Habits!A2:F");
        assert_eq!(data_range(COMPLETIONS_TAB), "Completions!A2:C");
        assert_eq!(data_range(SLEEP_TAB), "SleepData!A2:B");
        assert_eq!(data_range(ECONOMY_TAB), "Economy!A2:B");
        assert_eq!(data_range(INVENTORY_TAB), "Inventory!A2:E");
        assert_eq!(data_range(SHOP_TAB), "ShopItems!A2:E");
        assert_eq!(data_ranges().len(), 6);
    }

    #[test]
    fn test_header_update_contents() {
        let update = header_update(COMPLETIONS_TAB);
        assert_eq!(update.range, "Completions!A1:C1");
        assert_eq!(update.values, vec![row(&["Habit ID", "Date", "Completed"])]);
    }

    #[test]
    fn test_completion_rows_use_upper_case_booleans() {
        let mut completions = BTreeMap::new();
        let mut days = BTreeMap::new();
        days.insert("2024-03-01".to_string(), true);
        days.insert("2024-03-02".to_string(), false);
        completions.insert("h1".to_string(), days);

        let rows = completions_to_rows(&completions);
        assert_eq!(rows[0], row(&["h1", "2024-03-01", "TRUE"]));
        assert_eq!(rows[1], row(&["h1", "2024-03-02", "FALSE"]));
    }

    #[test]
    fn test_bool_decoding_is_case_insensitive() {
        assert!(decode_bool("TRUE"));
        assert!(decode_bool("true"));
        assert!(decode_bool("True"));
        assert!(!decode_bool("FALSE"));
        assert!(!decode_bool("yes"));
        assert!(!decode_bool(""));
    }

    #[test]
    fn test_habit_decoding_skips_blank_ids_and_tolerates_junk() {
        let rows = vec![
            row(&["h1", "Run", "🏃", "Fitness", "move", "2024-03-01T08:00:00Z"]),
            row(&["", "ghost row"]),
            row(&["h2", "Read", "", "", "sparkle", "not a date"]),
        ];

        let habits = rows_to_habits(&rows);
        assert_eq!(habits.len(), 2);
        assert_eq!(habits[0].color, HabitColor::Move);
        // Unknown color tag and unparseable date fall back to defaults
        assert_eq!(habits[1].color, HabitColor::Exercise);
        assert!(habits[1].created_at <= Utc::now());
    }

    #[test]
    fn test_completion_decoding_skips_incomplete_rows() {
        let rows = vec![
            row(&["h1", "2024-03-01", "TRUE"]),
            row(&["h1", "", "TRUE"]),
            row(&["", "2024-03-02", "TRUE"]),
            row(&["h1", "2024-03-03"]),
        ];

        let completions = rows_to_completions(&rows);
        let days = completions.get("h1").unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days.get("2024-03-01"), Some(&true));
        // Missing Completed cell reads as false
        assert_eq!(days.get("2024-03-03"), Some(&false));
    }

    #[test]
    fn test_economy_decoding_applies_defaults() {
        let rows = vec![
            row(&["Points", "oops"]),
            row(&["Streak", "4"]),
        ];

        let (points, streak, rank) = rows_to_economy(&rows);
        assert_eq!(points, 0);
        assert_eq!(streak, 4);
        assert_eq!(rank, "Apprentice");
    }

    #[test]
    fn test_inventory_decoding_defaults_desire_level() {
        let rows = vec![row(&[
            "t1",
            "Watch 1 Movie",
            "2024-03-01T12:00:00Z",
            "TRUE",
            "2",
        ])];

        let inventory = rows_to_inventory(&rows);
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].desire_level, 0);
        assert!(inventory[0].is_used);
        assert_eq!(inventory[0].item_id, "2");
    }

    #[test]
    fn test_shop_decoding_defaults_unparseable_desire() {
        let rows = vec![
            row(&["1", "Fast Food", "seven", "consumable", ""]),
            row(&["2", "Movie", "9"]),
        ];

        let items = rows_to_shop_items(&rows);
        assert_eq!(items[0].desire_level, 5);
        assert_eq!(items[1].desire_level, 9);
        assert_eq!(items[1].kind, ShopItemKind::Consumable);
    }

    #[test]
    fn test_snapshot_updates_skip_empty_tabs() {
        let snapshot = RemoteSnapshot::default();
        let updates = snapshot_updates(&snapshot);

        // Only the economy block always has rows
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].range, "Economy!A2");
        assert_eq!(updates[0].values[0], row(&["Points", "0"]));
    }

    #[test]
    fn test_snapshot_round_trip_through_rows() {
        let mut snapshot = RemoteSnapshot::default();
        snapshot.flat.habits.push(Habit {
            id: "h1".to_string(),
            name: "Run".to_string(),
            icon: "🏃".to_string(),
            category: "Fitness".to_string(),
            color: HabitColor::Move,
            created_at: "2024-03-01T08:00:00Z".parse().unwrap(),
        });
        snapshot
            .flat
            .completions
            .entry("h1".to_string())
            .or_default()
            .insert("2024-03-01".to_string(), true);
        snapshot.market.points = 120;
        snapshot.market.shop_items.push(ShopItem {
            id: "1".to_string(),
            name: "Movie".to_string(),
            desire_level: 9,
            kind: ShopItemKind::Consumable,
        });

        // Rebuild the tables a download would produce
        let tables = vec![
            habits_to_rows(&snapshot.flat.habits),
            completions_to_rows(&snapshot.flat.completions),
            sleep_to_rows(&snapshot.flat.sleep_data),
            economy_to_rows(&snapshot.market),
            inventory_to_rows(&snapshot.market.inventory),
            shop_items_to_rows(&snapshot.market.shop_items),
        ];
        let decoded = snapshot_from_tables(&tables);

        assert_eq!(decoded.flat.habits, snapshot.flat.habits);
        assert_eq!(decoded.flat.completions, snapshot.flat.completions);
        assert_eq!(decoded.market.points, 120);
        assert_eq!(decoded.market.shop_items, snapshot.market.shop_items);
    }
}
