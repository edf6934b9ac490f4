//! # Domain Module
//!
//! Contains all business logic for the habit tracker.
//!
//! This module encapsulates the core business rules, entities, and services
//! that define how habits are tracked and how the gamified market behaves.
//! It operates independently of any specific UI framework, storage mechanism
//! or network transport.
//!
//! ## Module Organization
//!
//! - **habit_service**: Habit CRUD, completions, sleep logs, stats, backup and sync orchestration
//! - **market_service**: Daily tasks, points economy, shop catalog and lottery
//! - **market_math**: Pure reward and lottery-weight calculations
//! - **commands**: Internal command and result types passed to the services
//! - **models**: Domain entities shared across layers
//!
//! ## Key Responsibilities
//!
//! - **Habit Management**: Creating, deleting and checking off habits per day
//! - **Statistics**: Completion percentages and streaks per habit and month
//! - **Economy Enforcement**: Rewards, penalties and the zero floor on points
//! - **Daily Rollover**: Task lists reset on the first read of a new day
//! - **Sync Orchestration**: Flattening local state and applying remote snapshots
//!
//! ## Business Rules
//!
//! - Habit names and task titles must be non-empty
//! - Completion toggles are strict flips; toggling twice restores the start state
//! - Completing a todo pays by priority (high 100, medium 30, low 10), once per day
//! - Failing an anti-todo deducts its cost but never drives points below zero
//! - The lottery charges only when a prize is won
//!
//! ## Design Principles
//!
//! - **Storage Agnostic**: Services work against the storage traits only
//! - **UI Agnostic**: View state is plain data, cloneable into any frontend
//! - **Testability**: Pure math lives in `market_math`, exercised directly in tests

pub mod commands;
pub mod habit_service;
pub mod market_math;
pub mod market_service;
pub mod models;

pub use commands::*;
pub use habit_service::*;
pub use market_service::*;
