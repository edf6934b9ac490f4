//! # Market Service
//!
//! Gamification operations: daily todos and anti-todos, the points
//! economy, the shop catalog and the lottery. Rewards and penalties are
//! pure functions in `market_math`; this service wires them to storage
//! and keeps a view state for UI clones.
//!
//! Mutations re-read the document first (which also runs the daily
//! rollover) so a decision like "has this todo already been completed?"
//! is always made against what is on disk, not a stale view.

use anyhow::Result;
use chrono::Utc;
use log::info;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::commands::shop::{AddShopItemCommand, LotteryOutcome};
use crate::domain::commands::tasks::{CreateAntiTodoCommand, CreateTodoCommand};
use crate::domain::market_math;
use crate::domain::models::{
    AntiTodo, EconomyRecord, MarketSnapshot, ShopItem, ShopValidationError, TaskKind,
    TaskValidationError, Ticket, Todo,
};
use crate::storage::traits::{Connection, MarketStorage};

/// In-memory view state shared by service clones
#[derive(Debug, Clone)]
struct MarketViewState {
    economy: EconomyRecord,
    todos: Vec<Todo>,
    not_todos: Vec<AntiTodo>,
    shop_items: Vec<ShopItem>,
    is_loading: bool,
}

impl Default for MarketViewState {
    fn default() -> Self {
        Self {
            economy: EconomyRecord::default(),
            todos: Vec::new(),
            not_todos: Vec::new(),
            shop_items: Vec::new(),
            is_loading: true,
        }
    }
}

/// Service for daily tasks, the points economy and the shop
#[derive(Clone)]
pub struct MarketService<C: Connection> {
    market_repository: C::MarketRepository,
    state: Arc<Mutex<MarketViewState>>,
}

impl<C: Connection> MarketService<C> {
    /// Create a new market service backed by the given connection
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            market_repository: connection.create_market_repository(),
            state: Arc::new(Mutex::new(MarketViewState::default())),
        }
    }

    /// Load persisted state into memory, rolling the daily tasks over to
    /// today if needed. Call once at startup.
    pub fn initialize(&self) -> Result<()> {
        self.market_repository.initialize()?;
        self.refresh()?;

        let state = self.state.lock().unwrap();
        info!(
            "✅ Market service initialized: {} points, {} todos, {} shop items",
            state.economy.points,
            state.todos.len(),
            state.shop_items.len()
        );
        Ok(())
    }

    /// Re-read everything from storage into the view state
    pub fn refresh(&self) -> Result<()> {
        let economy = self.market_repository.get_economy()?;
        let tasks = self.market_repository.get_daily_tasks()?;
        let shop_items = self.market_repository.get_shop_items()?;

        let mut state = self.state.lock().unwrap();
        state.economy = economy;
        state.todos = tasks.todos;
        state.not_todos = tasks.not_todos;
        state.shop_items = shop_items;
        state.is_loading = false;
        Ok(())
    }

    // === View state accessors ===

    pub fn points(&self) -> i64 {
        self.state.lock().unwrap().economy.points
    }

    pub fn streak(&self) -> i64 {
        self.state.lock().unwrap().economy.streak
    }

    pub fn rank(&self) -> String {
        self.state.lock().unwrap().economy.rank.clone()
    }

    pub fn inventory(&self) -> Vec<Ticket> {
        self.state.lock().unwrap().economy.inventory.clone()
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.state.lock().unwrap().todos.clone()
    }

    pub fn not_todos(&self) -> Vec<AntiTodo> {
        self.state.lock().unwrap().not_todos.clone()
    }

    pub fn shop_items(&self) -> Vec<ShopItem> {
        self.state.lock().unwrap().shop_items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    // === Daily todos ===

    /// Create a todo for today's list
    pub fn add_todo(&self, command: CreateTodoCommand) -> Result<Todo> {
        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskValidationError::EmptyTitle.into());
        }

        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            title,
            priority: command.priority.unwrap_or_default(),
            completed: false,
            notes: command.notes.unwrap_or_default(),
            protocol: command.protocol.unwrap_or_default(),
            created_at: Utc::now(),
        };

        let mut tasks = self.market_repository.get_daily_tasks()?;
        tasks.todos.push(todo.clone());
        self.market_repository.save_daily_tasks(&tasks)?;

        let mut state = self.state.lock().unwrap();
        state.todos = tasks.todos;
        state.not_todos = tasks.not_todos;

        Ok(todo)
    }

    /// Mark a todo complete and award its priority's reward. Returns the
    /// points awarded; 0 when the todo is missing or already complete.
    pub fn complete_todo(&self, todo_id: &str) -> Result<i64> {
        let mut tasks = self.market_repository.get_daily_tasks()?;
        let todo = match tasks.todos.iter_mut().find(|todo| todo.id == todo_id) {
            Some(todo) => todo,
            None => return Ok(0),
        };
        if todo.completed {
            return Ok(0);
        }

        todo.completed = true;
        let reward = market_math::task_reward(todo.priority);
        let title = todo.title.clone();

        let mut economy = self.market_repository.get_economy()?;
        economy.points += reward;

        self.market_repository.save_daily_tasks(&tasks)?;
        self.market_repository.save_economy(&economy)?;

        let mut state = self.state.lock().unwrap();
        state.todos = tasks.todos;
        state.not_todos = tasks.not_todos;
        state.economy = economy;

        info!("✅ Completed '{}' (+{} points)", title, reward);
        Ok(reward)
    }

    // === Anti-todos ===

    /// Create an anti-todo (a habit to avoid) for today's list
    pub fn add_not_todo(&self, command: CreateAntiTodoCommand) -> Result<AntiTodo> {
        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskValidationError::EmptyTitle.into());
        }
        let cost = match command.cost {
            None => AntiTodo::DEFAULT_COST,
            Some(cost) if cost <= 0 => return Err(TaskValidationError::NonPositiveCost.into()),
            Some(cost) => cost,
        };

        let anti = AntiTodo {
            id: Uuid::new_v4().to_string(),
            title,
            cost,
            notes: command.notes.unwrap_or_default(),
            fail_count: 0,
            last_failed_at: None,
        };

        let mut tasks = self.market_repository.get_daily_tasks()?;
        tasks.not_todos.push(anti.clone());
        self.market_repository.save_daily_tasks(&tasks)?;

        let mut state = self.state.lock().unwrap();
        state.todos = tasks.todos;
        state.not_todos = tasks.not_todos;

        Ok(anti)
    }

    /// Record a failure against an anti-todo: deduct its cost (points
    /// never go below zero) and bump the day's fail count. Returns the
    /// penalty charged; 0 when the anti-todo is missing.
    pub fn fail_not_todo(&self, anti_id: &str) -> Result<i64> {
        let mut tasks = self.market_repository.get_daily_tasks()?;
        let anti = match tasks.not_todos.iter_mut().find(|anti| anti.id == anti_id) {
            Some(anti) => anti,
            None => return Ok(0),
        };

        anti.fail_count += 1;
        anti.last_failed_at = Some(Utc::now());
        let penalty = anti.cost;
        let title = anti.title.clone();

        let mut economy = self.market_repository.get_economy()?;
        economy.points = (economy.points - penalty).max(0);

        self.market_repository.save_daily_tasks(&tasks)?;
        self.market_repository.save_economy(&economy)?;

        let mut state = self.state.lock().unwrap();
        state.todos = tasks.todos;
        state.not_todos = tasks.not_todos;
        state.economy = economy;

        info!("❌ Failed '{}' (-{} points)", title, penalty);
        Ok(penalty)
    }

    /// Remove a task from either daily list
    pub fn delete_task(&self, task_id: &str, kind: TaskKind) -> Result<bool> {
        let mut tasks = self.market_repository.get_daily_tasks()?;
        let removed = match kind {
            TaskKind::Todo => {
                let before = tasks.todos.len();
                tasks.todos.retain(|todo| todo.id != task_id);
                tasks.todos.len() != before
            }
            TaskKind::Avoid => {
                let before = tasks.not_todos.len();
                tasks.not_todos.retain(|anti| anti.id != task_id);
                tasks.not_todos.len() != before
            }
        };

        if removed {
            self.market_repository.save_daily_tasks(&tasks)?;
            let mut state = self.state.lock().unwrap();
            state.todos = tasks.todos;
            state.not_todos = tasks.not_todos;
        }
        Ok(removed)
    }

    // === Shop catalog ===

    /// Add an item to the shop catalog
    pub fn add_shop_item(&self, command: AddShopItemCommand) -> Result<ShopItem> {
        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(ShopValidationError::EmptyName.into());
        }

        let item = ShopItem {
            id: Uuid::new_v4().to_string(),
            name,
            desire_level: command.desire_level.unwrap_or(5),
            kind: Default::default(),
        };

        let mut items = self.market_repository.get_shop_items()?;
        items.push(item.clone());
        self.market_repository.save_shop_items(&items)?;
        self.state.lock().unwrap().shop_items = items;

        Ok(item)
    }

    /// Remove an item from the catalog. Tickets already won from it stay
    /// in the inventory.
    pub fn remove_shop_item(&self, item_id: &str) -> Result<bool> {
        let mut items = self.market_repository.get_shop_items()?;
        let before = items.len();
        items.retain(|item| item.id != item_id);

        if items.len() == before {
            return Ok(false);
        }

        self.market_repository.save_shop_items(&items)?;
        self.state.lock().unwrap().shop_items = items;
        Ok(true)
    }

    // === Lottery and inventory ===

    /// Spend points on a lottery draw (default cost 100). Points are only
    /// charged when a prize is actually won.
    pub fn buy_lottery_ticket(&self, cost: Option<i64>) -> Result<LotteryOutcome> {
        let cost = cost.unwrap_or(market_math::DEFAULT_LOTTERY_COST);

        let items = self.market_repository.get_shop_items()?;
        if items.is_empty() {
            return Ok(LotteryOutcome::ShopEmpty);
        }

        let mut economy = self.market_repository.get_economy()?;
        if economy.points < cost {
            return Ok(LotteryOutcome::InsufficientPoints {
                points: economy.points,
                cost,
            });
        }

        let mut rng = rand::thread_rng();
        let item = match market_math::draw_lottery(&items, market_math::DEFAULT_LUCK_FLOOR, &mut rng)
        {
            Some(item) => item.clone(),
            // Non-empty catalog always yields a prize
            None => return Ok(LotteryOutcome::ShopEmpty),
        };

        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            item_id: item.id.clone(),
            name: item.name.clone(),
            desire_level: item.desire_level,
            won_at: Utc::now(),
            is_used: false,
        };

        economy.points -= cost;
        economy.inventory.push(ticket.clone());
        self.market_repository.save_economy(&economy)?;
        self.state.lock().unwrap().economy = economy;

        info!("🎟️ Lottery: won '{}' for {} points", item.name, cost);
        Ok(LotteryOutcome::Won { item, ticket })
    }

    /// Consume a won ticket, removing it from the inventory. Returns false
    /// when no ticket with that id exists.
    pub fn use_inventory_item(&self, ticket_id: &str) -> Result<bool> {
        let mut economy = self.market_repository.get_economy()?;
        let before = economy.inventory.len();
        economy.inventory.retain(|ticket| ticket.id != ticket_id);

        if economy.inventory.len() == before {
            return Ok(false);
        }

        self.market_repository.save_economy(&economy)?;
        self.state.lock().unwrap().economy = economy;
        Ok(true)
    }

    // === Sync support ===

    /// Everything the remote document needs from the market side
    pub fn snapshot(&self) -> Result<MarketSnapshot> {
        let economy = self.market_repository.get_economy()?;
        let shop_items = self.market_repository.get_shop_items()?;

        Ok(MarketSnapshot {
            points: economy.points,
            streak: economy.streak,
            rank: economy.rank,
            inventory: economy.inventory,
            shop_items,
        })
    }

    /// Overwrite local market state with a downloaded snapshot. Daily
    /// tasks are device-local and untouched.
    pub fn apply_snapshot(&self, snapshot: &MarketSnapshot) -> Result<()> {
        let mut economy = self.market_repository.get_economy()?;
        economy.points = snapshot.points;
        economy.streak = snapshot.streak;
        economy.rank = snapshot.rank.clone();
        economy.inventory = snapshot.inventory.clone();

        self.market_repository.save_economy(&economy)?;
        self.market_repository.save_shop_items(&snapshot.shop_items)?;
        self.refresh()?;

        info!("✅ Applied remote market snapshot ({} points)", snapshot.points);
        Ok(())
    }
}
