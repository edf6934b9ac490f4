//! # Habit Tracker Core
//!
//! Local persistence and synchronization core for a personal habit/task
//! tracker. This crate contains all non-UI logic:
//! - **Domain**: habit statistics, task lifecycle, the reward economy and
//!   the weighted lottery
//! - **Storage**: versioned JSON documents persisted on disk, organized
//!   by calendar month
//! - **Sync**: translation between the local documents and a remote
//!   spreadsheet-backed tabular store, plus the auto-sync scheduler
//!
//! The core is designed to be UI-agnostic: a desktop shell, a TUI or a
//! CLI can all drive it through the same service objects.
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//! ```text
//! UI Layer (external)
//!     ↓
//! Domain Layer (services, statistics, lottery math)
//!     ↓
//! Storage Layer (JSON repositories, settings)
//!     ↓
//! Sync Layer (remote tabular store, OAuth, scheduler)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize and hold the application state (explicit lifecycle, no
//!   ambient globals)
//! - Keep in-memory state and the durable documents from drifting apart
//! - Convert between month-partitioned local storage and the flat
//!   representation the remote store uses

pub mod dates;
pub mod domain;
pub mod storage;
pub mod sync;

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::domain::{HabitService, MarketService};
use crate::storage::{Connection, JsonConnection};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState<C: Connection> {
    pub habit_service: HabitService<C>,
    pub market_service: MarketService<C>,
}

/// Initialize the core with all required services backed by the default
/// on-disk storage location.
pub fn initialize_core() -> Result<AppState<JsonConnection>> {
    let connection = JsonConnection::new_default()?;
    initialize_core_with_connection(Arc::new(connection))
}

/// Initialize the core against an explicit storage connection.
///
/// Services are constructed once here and handed to the caller; their
/// `initialize()` has already run, so reactive state is ready to read.
pub fn initialize_core_with_connection<C: Connection>(connection: Arc<C>) -> Result<AppState<C>> {
    info!("Setting up storage");
    let habit_service = HabitService::new(connection.clone());
    let market_service = MarketService::new(connection);

    info!("Loading domain state");
    habit_service.initialize()?;
    market_service.initialize()?;

    info!("Application state ready");
    Ok(AppState {
        habit_service,
        market_service,
    })
}
