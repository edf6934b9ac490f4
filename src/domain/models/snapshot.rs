//! Flat snapshot shapes used on the sync path.
//!
//! Local habit data is partitioned by month on disk; the remote tabular
//! store wants flat per-habit and per-day maps. These types are the
//! de-partitioned form that travels between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::habit::{Habit, SleepEntry};
use super::market::{ShopItem, Ticket};

/// How a downloaded snapshot is applied to local storage.
///
/// `Merge` is local-wins: an existing local value for a `(habit, day)` pair
/// or a sleep day takes precedence over the incoming remote value, so
/// merging is not commutative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Replace,
    Merge,
}

/// De-partitioned habit-side data: all months flattened into single maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatSnapshot {
    pub habits: Vec<Habit>,
    /// habit id → day key → completed
    pub completions: BTreeMap<String, BTreeMap<String, bool>>,
    /// day key → sleep entry
    pub sleep_data: BTreeMap<String, SleepEntry>,
}

/// Market-side data carried alongside the habit snapshot on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub points: i64,
    pub streak: i64,
    pub rank: String,
    pub inventory: Vec<Ticket>,
    pub shop_items: Vec<ShopItem>,
}

impl Default for MarketSnapshot {
    fn default() -> Self {
        Self {
            points: 0,
            streak: 0,
            rank: super::market::EconomyRecord::DEFAULT_RANK.to_string(),
            inventory: Vec::new(),
            shop_items: Vec::new(),
        }
    }
}

/// Everything one upload writes and one download reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub flat: FlatSnapshot,
    pub market: MarketSnapshot,
}
