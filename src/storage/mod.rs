//! # Storage Module
//!
//! Handles all data persistence operations for the habit tracker.
//!
//! This module abstracts away the specific storage implementation details and
//! provides a consistent interface for persisting and retrieving data. The
//! implementation can be swapped out (JSON files, SQLite, cloud storage, etc.)
//! without affecting the domain logic or any UI built on top.
//!
//! ## Key Responsibilities
//!
//! - **Data Persistence**: Saving habits, completions and market state to disk
//! - **Data Retrieval**: Loading stored documents back into memory
//! - **Storage Abstraction**: Providing a consistent API regardless of backend
//! - **Schema Versioning**: Every document carries a version and is gated on load
//! - **Write Safety**: Atomic file writes so a crash never leaves half a document
//!
//! ## Current Implementation
//!
//! - **Primary Storage**: Versioned JSON documents in the user's data directory
//! - **Settings**: A small YAML file for sync preferences
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: Clean separation between domain and data access
//! - **Dependency Inversion**: Domain depends on storage traits, not implementations
//! - **Testability**: Repositories run against temp directories in tests

pub mod json;
pub mod traits;

// Re-export the main types that other modules need
pub use json::JsonConnection;
pub use traits::{Connection, HabitStorage, MarketStorage};
