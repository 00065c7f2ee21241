use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::query::{SortField, SortOrder, StoryQuery};
use crate::storage::store::StoryStore;
use crate::storage::types::{Story, Vote, VoteDirection};

/// On-disk document for the file backend. Loaded once at startup and written
/// back on every mutation; requests never reparse the file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct BoardState {
    next_id: i64,
    stories: Vec<Story>,
    votes: Vec<Vote>,
}

/// JSON-file backed story store. All state lives in memory behind a single
/// mutex, which also serializes the vote read-modify-write path.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<BoardState>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                error!("Failed to read store file {}: {}", path.display(), e);
                StoreError::Unavailable(e.to_string())
            })?;
            let mut state: BoardState = serde_json::from_str(&raw).map_err(|e| {
                error!("Failed to parse store file {}: {}", path.display(), e);
                StoreError::Unavailable(e.to_string())
            })?;
            // next_id is monotonic even if an older document predates it
            let max_id = state.stories.iter().map(|s| s.id).max().unwrap_or(0);
            state.next_id = state.next_id.max(max_id + 1).max(1);
            state
        } else {
            BoardState {
                next_id: 1,
                ..Default::default()
            }
        };
        info!(
            "FileStore initialized at {} ({} stories)",
            path.display(),
            state.stories.len()
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BoardState>, StoreError> {
        self.state.lock().map_err(|_| {
            error!("Store state lock poisoned");
            StoreError::Unavailable("state lock poisoned".into())
        })
    }

    fn persist(&self, state: &BoardState) -> Result<(), StoreError> {
        let file = File::create(&self.path).map_err(|e| {
            error!("Failed to create store file {}: {}", self.path.display(), e);
            StoreError::Unavailable(e.to_string())
        })?;
        serde_json::to_writer_pretty(file, state).map_err(|e| {
            error!("Failed to write store file {}: {}", self.path.display(), e);
            StoreError::Unavailable(e.to_string())
        })?;
        debug!("Persisted {} story(ies) to {}", state.stories.len(), self.path.display());
        Ok(())
    }

    fn locate(stories: &[Story], id: i64) -> Result<usize, StoreError> {
        if id <= 0 {
            return Err(StoreError::NotFound);
        }
        stories
            .iter()
            .position(|s| s.id == id)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl StoryStore for FileStore {
    async fn list(&self, query: &StoryQuery) -> Result<Vec<Story>, StoreError> {
        let state = self.lock()?;
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut stories: Vec<Story> = state
            .stories
            .iter()
            .filter(|s| match &needle {
                Some(n) => s.title.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();
        stories.sort_by(|a, b| {
            let ord = match query.sort {
                SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                SortField::Score => a.score.cmp(&b.score),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            match query.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        debug!(
            "Listed {} of {} story(ies)",
            stories.len(),
            state.stories.len()
        );
        Ok(stories)
    }

    async fn create(&self, title: &str, url: &str) -> Result<Story, StoreError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let story = Story {
            id: state.next_id,
            title: title.to_string(),
            url: url.to_string(),
            score: 0,
            created_at: now,
            updated_at: now,
        };
        state.next_id += 1;
        state.stories.push(story.clone());
        self.persist(&state)?;
        info!("Created story {} ({})", story.id, story.title);
        Ok(story)
    }

    async fn get(&self, id: i64) -> Result<Story, StoreError> {
        let state = self.lock()?;
        let idx = Self::locate(&state.stories, id)?;
        Ok(state.stories[idx].clone())
    }

    async fn update(&self, id: i64, title: &str, url: &str) -> Result<Story, StoreError> {
        let mut state = self.lock()?;
        let idx = Self::locate(&state.stories, id)?;
        {
            let story = &mut state.stories[idx];
            story.title = title.to_string();
            story.url = url.to_string();
            story.updated_at = Utc::now();
        }
        self.persist(&state)?;
        Ok(state.stories[idx].clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let idx = Self::locate(&state.stories, id)?;
        let removed = state.stories.remove(idx);
        self.persist(&state)?;
        info!("Deleted story {}", removed.id);
        Ok(())
    }

    async fn apply_vote(&self, id: i64, direction: VoteDirection) -> Result<Story, StoreError> {
        let mut state = self.lock()?;
        let idx = Self::locate(&state.stories, id)?;
        if direction == VoteDirection::Down && state.stories[idx].score == 0 {
            return Err(StoreError::InvalidVote);
        }
        let now = Utc::now();
        {
            let story = &mut state.stories[idx];
            story.score += direction.delta();
            story.updated_at = now;
        }
        state.votes.push(Vote {
            story_id: id,
            direction,
            created_at: now,
            updated_at: now,
        });
        self.persist(&state)?;
        debug!("Applied {} vote to story {}", direction.as_str(), id);
        Ok(state.stories[idx].clone())
    }
}
