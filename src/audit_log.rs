use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::{LandRecordError, Result};
use crate::models::{NewSearchRequest, SearchRequest, SearchStatus};
use crate::repository::SearchRequestRepository;

const TREE: &str = "search_requests";

/// Search audit trail persisted in an embedded `sled` database.
pub struct SledSearchLog {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledSearchLog {
    /// Open (or create) the log under `path`.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let tree = db.open_tree(TREE)?;
        Ok(Self { db, tree })
    }

    fn key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    /// Number of audit rows stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True when nothing has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.tree.flush_async().await?;
        Ok(())
    }
}

#[async_trait]
impl SearchRequestRepository for SledSearchLog {
    async fn create(&self, request: NewSearchRequest) -> Result<SearchRequest> {
        // sled ids start at zero; audit ids start at one.
        let id = self.db.generate_id()? + 1;
        let row = request.into_request(id);
        let data = bincode::serialize(&row)?;
        self.tree.insert(Self::key(id), data)?;
        debug!(search_request_id = id, "Audit row created");
        Ok(row)
    }

    async fn update_status(&self, id: u64, status: SearchStatus) -> Result<SearchRequest> {
        let key = Self::key(id);
        loop {
            let current = self.tree.get(key)?.ok_or(LandRecordError::NotFound {
                entity: "search request",
                id,
            })?;
            let mut row: SearchRequest = bincode::deserialize(&current)?;
            if !row.status.can_transition_to(status) {
                return Err(LandRecordError::InvalidTransition {
                    id,
                    from: row.status.to_string(),
                    to: status.to_string(),
                });
            }
            row.status = status;
            let data = bincode::serialize(&row)?;

            // Another writer may have moved the row first; re-read and re-check.
            match self.tree.compare_and_swap(key, Some(current), Some(data))? {
                Ok(()) => return Ok(row),
                Err(_) => continue,
            }
        }
    }

    async fn get(&self, id: u64) -> Result<Option<SearchRequest>> {
        match self.tree.get(Self::key(id))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }
}
