//! Story Store trait
//!
//! This module defines the `StoryStore` trait, which provides an interface
//! for story persistence backends.
//!
//! Implementors of this trait are responsible for:
//! - Assigning sequential, never-reused story ids
//! - Filtering and ordering the collection for listing
//! - Recording vote events and keeping the cached score in step with them
//!
//! All methods return a `Result` to handle potential storage errors.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::StoryQuery;
use crate::storage::types::{Story, VoteDirection};

/// The `StoryStore` trait defines the interface for story persistence
/// backends.
///
/// Mutating operations validate the id first: a non-positive id, an id beyond
/// the highest one assigned, or a deleted id all fail with
/// `StoreError::NotFound`.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Returns stories matching the query, filtered by a case-insensitive
    /// substring match on title when a search term is present, ordered by
    /// the query's sort field and order.
    async fn list(&self, query: &StoryQuery) -> Result<Vec<Story>, StoreError>;

    /// Creates a story with the next sequential id, score 0 and both
    /// timestamps set to now. Returns the new record.
    async fn create(&self, title: &str, url: &str) -> Result<Story, StoreError>;

    /// Retrieves a story by id.
    async fn get(&self, id: i64) -> Result<Story, StoreError>;

    /// Overwrites title and url, refreshing `updated_at`. Score and id are
    /// left untouched.
    async fn update(&self, id: i64, title: &str, url: &str) -> Result<Story, StoreError>;

    /// Removes a story. Its id is never reassigned.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Records a vote event and adjusts the cached score atomically. A
    /// downvote on a story whose score is already 0 fails with
    /// `StoreError::InvalidVote` and changes nothing.
    async fn apply_vote(&self, id: i64, direction: VoteDirection) -> Result<Story, StoreError>;
}
