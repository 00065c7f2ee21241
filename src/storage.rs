//! Storage subsystem
//!
//! This module provides abstractions and implementations for persisting
//! stories and their vote events.
//!
//! Components:
//! - `store`: the StoryStore trait defining a uniform API.
//! - `types`: shared data types used by storage backends.
//! - `db_store`: SQLite implementation using sqlx.
//! - `file_store`: JSON-file implementation for simple persistence and inspection.

pub mod db_store;
pub mod file_store;
pub mod store;
pub mod types;
