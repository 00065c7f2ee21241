use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::error::StoreError;
use crate::query::{SortField, StoryQuery};
use crate::storage::store::StoryStore;
use crate::storage::types::{Story, VoteDirection};

const SELECT_STORY: &str = "SELECT id, title, url, score, created_at, updated_at FROM stories";

// Internal row mapping for stories to avoid manual try_get
#[derive(Debug, sqlx::FromRow)]
struct StoryRow {
    id: i64,
    title: String,
    url: String,
    score: i64,
    created_at: String,
    updated_at: String,
}

impl StoryRow {
    fn into_story(self) -> Result<Story, StoreError> {
        let parse = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    error!("Invalid timestamp in stories table: {}", e);
                    StoreError::Unavailable(e.to_string())
                })
        };
        Ok(Story {
            id: self.id,
            title: self.title,
            url: self.url,
            score: self.score,
            created_at: parse(&self.created_at)?,
            updated_at: parse(&self.updated_at)?,
        })
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    error!("Database error: {}", e);
    StoreError::Unavailable(e.to_string())
}

/// SQLite-backed story store. Ids come from AUTOINCREMENT, so they are
/// sequential and never reused within a database's lifetime. The vote path
/// runs in a transaction so the read-modify-write on the score cannot lose
/// updates.
pub struct DbStore {
    pool: Pool<Sqlite>,
}

impl DbStore {
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create database dir {}: {}", parent.display(), e);
                    StoreError::Unavailable(e.to_string())
                })?;
            }
        }
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(unavailable)?;
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await
            .map_err(unavailable)?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS stories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                score INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .execute(&pool)
        .await
        .map_err(unavailable)?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS votes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                story_id INTEGER NOT NULL,
                direction TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(story_id) REFERENCES stories(id) ON DELETE CASCADE
            );",
        )
        .execute(&pool)
        .await
        .map_err(unavailable)?;
        info!("DbStore initialized at {}", path.display());
        Ok(Self { pool })
    }

    // ORDER BY expressions are built from this whitelist only, never from
    // request input. Title ordering matches the file backend's
    // case-insensitive comparison.
    fn order_expr(sort: SortField) -> &'static str {
        match sort {
            SortField::Title => "title COLLATE NOCASE",
            _ => sort.column(),
        }
    }
}

#[async_trait]
impl StoryStore for DbStore {
    async fn list(&self, query: &StoryQuery) -> Result<Vec<Story>, StoreError> {
        let mut sql = String::from(SELECT_STORY);
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));
        if pattern.is_some() {
            sql.push_str(" WHERE title LIKE ?");
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(Self::order_expr(query.sort));
        sql.push(' ');
        sql.push_str(query.order.sql());

        let mut q = sqlx::query_as::<_, StoryRow>(&sql);
        if let Some(p) = &pattern {
            q = q.bind(p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(unavailable)?;
        debug!("Listed {} story(ies)", rows.len());
        rows.into_iter().map(StoryRow::into_story).collect()
    }

    async fn create(&self, title: &str, url: &str) -> Result<Story, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO stories (title, url, score, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?4)",
        )
        .bind(title)
        .bind(url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        let id = result.last_insert_rowid();
        info!("Created story {} ({})", id, title);
        self.get(id).await
    }

    async fn get(&self, id: i64) -> Result<Story, StoreError> {
        if id <= 0 {
            return Err(StoreError::NotFound);
        }
        let sql = format!("{} WHERE id = ?1", SELECT_STORY);
        let row = sqlx::query_as::<_, StoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.ok_or(StoreError::NotFound)?.into_story()
    }

    async fn update(&self, id: i64, title: &str, url: &str) -> Result<Story, StoreError> {
        if id <= 0 {
            return Err(StoreError::NotFound);
        }
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE stories SET title = ?1, url = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(title)
        .bind(url)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if id <= 0 {
            return Err(StoreError::NotFound);
        }
        let result = sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        info!("Deleted story {}", id);
        Ok(())
    }

    async fn apply_vote(&self, id: i64, direction: VoteDirection) -> Result<Story, StoreError> {
        if id <= 0 {
            return Err(StoreError::NotFound);
        }
        let mut tx = self.pool.begin().await.map_err(unavailable)?;
        let score: Option<i64> = sqlx::query_scalar("SELECT score FROM stories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unavailable)?;
        let score = score.ok_or(StoreError::NotFound)?;
        if direction == VoteDirection::Down && score == 0 {
            // dropping the transaction rolls it back
            return Err(StoreError::InvalidVote);
        }
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO votes (story_id, direction, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(direction.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;
        sqlx::query("UPDATE stories SET score = score + ?1, updated_at = ?2 WHERE id = ?3")
            .bind(direction.delta())
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        tx.commit().await.map_err(unavailable)?;
        debug!("Applied {} vote to story {}", direction.as_str(), id);
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortOrder;
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, DbStore) {
        let dir = TempDir::new().unwrap();
        let store = DbStore::connect(dir.path().join("test.sqlite3"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_then_get_matches() {
        let (_dir, store) = temp_store().await;
        let created = store.create("GOOGLE", "www.google.com").await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.score, 0);
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched.title, "GOOGLE");
        assert_eq!(fetched.url, "www.google.com");
    }

    #[tokio::test]
    async fn test_update_keeps_score_and_id() {
        let (_dir, store) = temp_store().await;
        let story = store.create("old", "old.example").await.unwrap();
        store.apply_vote(story.id, VoteDirection::Up).await.unwrap();
        let updated = store.update(story.id, "new", "new.example").await.unwrap();
        assert_eq!(updated.id, story.id);
        assert_eq!(updated.title, "new");
        assert_eq!(updated.score, 1);
    }

    #[tokio::test]
    async fn test_missing_ids_not_found() {
        let (_dir, store) = temp_store().await;
        assert!(matches!(store.get(1).await, Err(StoreError::NotFound)));
        assert!(matches!(store.get(-1).await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.update(1, "t", "u").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.delete(1).await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.apply_vote(1, VoteDirection::Up).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_vote_up_then_down_round_trips() {
        let (_dir, store) = temp_store().await;
        let story = store.create("t", "u").await.unwrap();
        for _ in 0..4 {
            store.apply_vote(story.id, VoteDirection::Up).await.unwrap();
        }
        for _ in 0..4 {
            store
                .apply_vote(story.id, VoteDirection::Down)
                .await
                .unwrap();
        }
        assert_eq!(store.get(story.id).await.unwrap().score, 0);
    }

    #[tokio::test]
    async fn test_downvote_at_zero_rejected_and_not_recorded() {
        let (_dir, store) = temp_store().await;
        let story = store.create("t", "u").await.unwrap();
        assert!(matches!(
            store.apply_vote(story.id, VoteDirection::Down).await,
            Err(StoreError::InvalidVote)
        ));
        assert_eq!(store.get(story.id).await.unwrap().score, 0);
        let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(votes, 0);
    }

    #[tokio::test]
    async fn test_vote_events_are_recorded() {
        let (_dir, store) = temp_store().await;
        let story = store.create("t", "u").await.unwrap();
        store.apply_vote(story.id, VoteDirection::Up).await.unwrap();
        store.apply_vote(story.id, VoteDirection::Up).await.unwrap();
        store
            .apply_vote(story.id, VoteDirection::Down)
            .await
            .unwrap();
        let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE story_id = ?1")
            .bind(story.id)
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(votes, 3);
        assert_eq!(store.get(story.id).await.unwrap().score, 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_votes() {
        let (_dir, store) = temp_store().await;
        let story = store.create("t", "u").await.unwrap();
        store.apply_vote(story.id, VoteDirection::Up).await.unwrap();
        store.delete(story.id).await.unwrap();
        assert!(matches!(
            store.get(story.id).await,
            Err(StoreError::NotFound)
        ));
        let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(votes, 0);
    }

    #[tokio::test]
    async fn test_ids_never_reused_after_delete() {
        let (_dir, store) = temp_store().await;
        store.create("a", "u").await.unwrap();
        let second = store.create("b", "u").await.unwrap();
        store.delete(second.id).await.unwrap();
        let third = store.create("c", "u").await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_search_and_sort() {
        let (_dir, store) = temp_store().await;
        for (title, ups) in [("alpha and one", 1), ("Beta AND five", 5), ("gamma", 3)] {
            let story = store.create(title, "u").await.unwrap();
            for _ in 0..ups {
                store.apply_vote(story.id, VoteDirection::Up).await.unwrap();
            }
        }
        let found = store
            .list(&StoryQuery {
                search: Some("and".into()),
                sort: SortField::Score,
                order: SortOrder::Descending,
            })
            .await
            .unwrap();
        let scores: Vec<_> = found.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![5, 1]);

        let by_title = store
            .list(&StoryQuery {
                sort: SortField::Title,
                order: SortOrder::Ascending,
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<_> = by_title.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha and one", "Beta AND five", "gamma"]);

        let none = store
            .list(&StoryQuery {
                search: Some("zzzzzz".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
