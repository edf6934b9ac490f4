//! Lottery weighting and task reward math.
//!
//! The lottery draws a shop item with probability inversely related to its
//! desire level: `weight = 10 / (desireLevel + 1) + luckFloor`. The luck
//! floor keeps every item winnable no matter how rare. Rewards for
//! completed todos come from a fixed priority table.

use rand::Rng;

use crate::domain::models::{ShopItem, TaskPriority};

/// Default credit cost of one lottery draw.
pub const DEFAULT_LOTTERY_COST: i64 = 100;

/// Additive weight floor guaranteeing no item has zero win probability.
pub const DEFAULT_LUCK_FLOOR: f64 = 0.5;

/// Lottery weight of a single item. Higher desire level means rarer.
pub fn item_weight(item: &ShopItem, luck_floor: f64) -> f64 {
    10.0 / (item.desire_level as f64 + 1.0) + luck_floor
}

/// Draw one item from the catalog by cumulative-distribution sampling.
///
/// Walks the catalog in order subtracting each weight from a uniform draw;
/// the first item whose weight exceeds the remainder wins. If floating
/// point rounding exhausts the loop, the first item wins. Returns `None`
/// only for an empty catalog.
pub fn draw_lottery<'a, R: Rng>(
    items: &'a [ShopItem],
    luck_floor: f64,
    rng: &mut R,
) -> Option<&'a ShopItem> {
    if items.is_empty() {
        return None;
    }

    let total_weight: f64 = items.iter().map(|item| item_weight(item, luck_floor)).sum();
    let mut remainder = rng.gen_range(0.0..total_weight);

    for item in items {
        let weight = item_weight(item, luck_floor);
        if remainder < weight {
            return Some(item);
        }
        remainder -= weight;
    }

    items.first()
}

/// Points awarded for completing a todo of the given priority.
pub fn task_reward(priority: TaskPriority) -> i64 {
    match priority {
        TaskPriority::High => 100,
        TaskPriority::Medium => 30,
        TaskPriority::Low => 10,
    }
}
