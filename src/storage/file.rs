//! In-memory link store with a JSON snapshot file.
//!
//! Every operation runs under one exclusive lock over the whole map.
//! Operations are O(set size), so a single lock keeps reads linearized
//! without hurting the request path. Backups are written atomically
//! (write to temp, then rename).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{LinkSet, LinkStatus, SetId};
use crate::storage::{LinkStore, Snapshot};
use crate::utils::normalize_url;

/// Local filesystem storage backend.
pub struct FileStore {
    state: Mutex<Snapshot>,
    path: PathBuf,
}

impl FileStore {
    /// Create an empty store that snapshots to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(Snapshot::default()),
            path: path.into(),
        }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier the next `save_links` call will return.
    pub async fn next_id(&self) -> SetId {
        self.state.lock().await.next_id
    }

    /// Write bytes atomically.
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the snapshot file, returning None if it doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn decode(bytes: &[u8]) -> serde_json::Result<Option<Snapshot>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(bytes).map(Some)
    }
}

#[async_trait]
impl LinkStore for FileStore {
    async fn save_links(&self, urls: &[String]) -> Result<SetId> {
        let mut state = self.state.lock().await;

        let id = state.next_id;
        state.next_id += 1;
        state.sets.insert(id, LinkSet::new(id, urls, Utc::now()));

        log::debug!("Saved link set {} with {} links", id, urls.len());
        Ok(id)
    }

    async fn get_link_set(&self, id: SetId) -> Option<LinkSet> {
        self.state.lock().await.sets.get(&id).cloned()
    }

    async fn get_link_sets(&self, ids: &[SetId]) -> Vec<LinkSet> {
        let state = self.state.lock().await;
        ids.iter()
            .filter_map(|id| state.sets.get(id).cloned())
            .collect()
    }

    async fn update_link_status(&self, id: SetId, url: &str, status: LinkStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let set = state.sets.get_mut(&id).ok_or(AppError::NotFound { id })?;

        let target = normalize_url(url);
        let mut matched = false;
        let mut applied = false;
        for link in set.links.iter_mut().filter(|l| l.url == target) {
            matched = true;
            // Resolved links never go back to pending.
            if status == LinkStatus::Pending && link.status.is_resolved() {
                continue;
            }
            link.status = status;
            applied = true;
        }

        if !matched {
            return Err(AppError::LinkNotFound { id, url: target });
        }
        if applied {
            set.updated_at = set.updated_at.max(Utc::now());
            log::debug!("Link set {}: {} -> {}", id, target, status);
        }
        Ok(())
    }

    async fn get_all_sets(&self) -> Vec<LinkSet> {
        self.state.lock().await.sets.values().cloned().collect()
    }

    async fn backup(&self) -> Result<()> {
        let (bytes, set_count) = {
            let state = self.state.lock().await;
            let bytes = serde_json::to_vec_pretty(&*state)
                .map_err(|e| AppError::persistence("cannot encode snapshot", e))?;
            (bytes, state.sets.len())
        };

        self.write_bytes(&bytes).await.map_err(|e| {
            AppError::persistence(format!("cannot write {}", self.path.display()), e)
        })?;

        log::info!(
            "Backed up {} link sets to {}",
            set_count,
            self.path.display()
        );
        Ok(())
    }

    async fn restore(&self) -> Result<()> {
        let bytes = self.read_bytes().await.map_err(|e| {
            AppError::persistence(format!("cannot open {}", self.path.display()), e)
        })?;

        let Some(bytes) = bytes else {
            log::info!(
                "No snapshot at {}, starting with an empty store",
                self.path.display()
            );
            return Ok(());
        };

        let snapshot = Self::decode(&bytes).map_err(|e| {
            AppError::persistence(format!("cannot decode {}", self.path.display()), e)
        })?;
        let Some(mut snapshot) = snapshot else {
            log::warn!("Snapshot {} is empty", self.path.display());
            return Ok(());
        };

        for (id, set) in snapshot.sets.iter_mut() {
            set.id = *id;
        }
        snapshot.next_id = snapshot.safe_next_id();

        let mut state = self.state.lock().await;
        *state = snapshot;
        log::info!(
            "Restored {} link sets from {} (next id {})",
            state.sets.len(),
            self.path.display(),
            state.next_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn store_in(tmp: &TempDir) -> FileStore {
        FileStore::new(tmp.path().join("storage.json"))
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let first = store.save_links(&urls(&["example.com", "https://good.test"])).await.unwrap();
        let second = store.save_links(&urls(&["a.org"])).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let set = store.get_link_set(1).await.unwrap();
        assert_eq!(set.links[0].url, "http://example.com");
        assert_eq!(set.links[1].url, "https://good.test");
        assert!(set.links.iter().all(|l| l.status == LinkStatus::Pending));
    }

    #[tokio::test]
    async fn test_get_link_sets_omits_unknown() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.save_links(&urls(&["a.com"])).await.unwrap();
        store.save_links(&urls(&["b.com"])).await.unwrap();

        let sets = store.get_link_sets(&[2, 42, 1]).await;
        let ids: Vec<_> = sets.iter().map(|s| s.id).collect();
        assert_eq!(ids, [2, 1]);

        assert!(store.get_link_set(42).await.is_none());
        assert!(store.get_link_sets(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_set() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let err = store
            .update_link_status(99, "x.com", LinkStatus::Available)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { id: 99 }));
    }

    #[tokio::test]
    async fn test_update_unknown_link() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let id = store.save_links(&urls(&["a.com"])).await.unwrap();

        let err = store
            .update_link_status(id, "b.com", LinkStatus::Available)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LinkNotFound { id: 1, ref url } if url == "http://b.com"));
    }

    #[tokio::test]
    async fn test_update_matches_normalized_url() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let id = store.save_links(&urls(&["example.com", "b.com"])).await.unwrap();
        let before = store.get_link_set(id).await.unwrap();

        store
            .update_link_status(id, "example.com", LinkStatus::Unavailable)
            .await
            .unwrap();
        store
            .update_link_status(id, "http://b.com", LinkStatus::Available)
            .await
            .unwrap();

        let after = store.get_link_set(id).await.unwrap();
        assert_eq!(after.links[0].status, LinkStatus::Unavailable);
        assert_eq!(after.links[1].status, LinkStatus::Available);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_resolved_link_never_returns_to_pending() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let id = store.save_links(&urls(&["a.com"])).await.unwrap();

        store
            .update_link_status(id, "a.com", LinkStatus::Available)
            .await
            .unwrap();
        store
            .update_link_status(id, "a.com", LinkStatus::Pending)
            .await
            .unwrap();

        let set = store.get_link_set(id).await.unwrap();
        assert_eq!(set.links[0].status, LinkStatus::Available);
    }

    #[tokio::test]
    async fn test_duplicate_urls_resolve_together() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let id = store
            .save_links(&urls(&["a.com", "http://a.com"]))
            .await
            .unwrap();

        store
            .update_link_status(id, "a.com", LinkStatus::Unavailable)
            .await
            .unwrap();

        let set = store.get_link_set(id).await.unwrap();
        assert_eq!(set.pending_links().count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_updates_stay_consistent() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store_in(&tmp));
        let id = store.save_links(&urls(&["a.com", "b.com"])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            let status = if i % 2 == 0 {
                LinkStatus::Available
            } else {
                LinkStatus::Unavailable
            };
            handles.push(tokio::spawn(async move {
                store.update_link_status(id, "a.com", status).await.unwrap();
                store.get_link_set(id).await.unwrap().updated_at
            }));
        }

        let mut last_seen = Vec::new();
        for handle in handles {
            last_seen.push(handle.await.unwrap());
        }

        let set = store.get_link_set(id).await.unwrap();
        assert!(set.links[0].status.is_resolved());
        assert_eq!(set.links[1].status, LinkStatus::Pending);
        assert!(last_seen.iter().all(|seen| *seen <= set.updated_at));
    }

    #[tokio::test]
    async fn test_backup_restore_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.save_links(&urls(&["a.com", "b.com"])).await.unwrap();
        store.save_links(&urls(&["https://c.com"])).await.unwrap();
        store
            .update_link_status(1, "b.com", LinkStatus::Available)
            .await
            .unwrap();
        store.backup().await.unwrap();

        let restored = store_in(&tmp);
        restored.restore().await.unwrap();

        assert_eq!(restored.get_all_sets().await, store.get_all_sets().await);
        assert_eq!(restored.next_id().await, 3);

        let id = restored.save_links(&urls(&["d.com"])).await.unwrap();
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn test_restore_missing_file_is_fresh_start() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        store.restore().await.unwrap();
        assert!(store.get_all_sets().await.is_empty());
        assert_eq!(store.next_id().await, 1);
    }

    #[tokio::test]
    async fn test_restore_corrupt_file_leaves_store_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::write(store.path(), b"{\"sets\": {\"1\": ").unwrap();

        let err = store.restore().await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(store.get_all_sets().await.is_empty());
        assert_eq!(store.next_id().await, 1);
    }

    #[tokio::test]
    async fn test_restore_empty_file() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::write(store.path(), b"\n").unwrap();

        store.restore().await.unwrap();
        assert!(store.get_all_sets().await.is_empty());
    }

    #[tokio::test]
    async fn test_restore_never_regresses_counter() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let now = Utc::now().to_rfc3339();
        let json = format!(
            r#"{{"sets": {{"4": {{"id": 4, "links": [], "created_at": "{now}", "updated_at": "{now}"}}}}, "next_id": 0}}"#
        );
        std::fs::write(store.path(), json).unwrap();

        store.restore().await.unwrap();
        assert_eq!(store.next_id().await, 5);

        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::write(store.path(), r#"{"sets": {}, "next_id": 0}"#).unwrap();
        store.restore().await.unwrap();
        assert_eq!(store.next_id().await, 1);
    }

    #[tokio::test]
    async fn test_backup_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nested/dir/storage.json"));
        store.save_links(&urls(&["a.com"])).await.unwrap();

        store.backup().await.unwrap();
        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
    }
}
