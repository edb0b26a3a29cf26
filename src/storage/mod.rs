//! Storage abstractions for link sets.
//!
//! The store owns every link set and its mutable status. All backends must
//! linearize operations: readers never observe a half-applied update.
//!
//! ## Snapshot Layout
//!
//! ```text
//! {
//!   "sets": { "1": { "id": 1, "links": [...], "created_at": ..., "updated_at": ... } },
//!   "next_id": 2
//! }
//! ```

pub mod file;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{LinkSet, LinkStatus, SetId};

// Re-export for convenience
pub use file::FileStore;

/// First identifier handed out by an empty store.
pub const FIRST_SET_ID: SetId = 1;

/// Full durable image of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub sets: BTreeMap<SetId, LinkSet>,

    /// Next identifier to hand out
    #[serde(default)]
    pub next_id: SetId,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            sets: BTreeMap::new(),
            next_id: FIRST_SET_ID,
        }
    }
}

impl Snapshot {
    /// Smallest identifier that is safe to issue next.
    ///
    /// Never below [`FIRST_SET_ID`] and never at or below an id already in use.
    pub fn safe_next_id(&self) -> SetId {
        let after_last = self
            .sets
            .keys()
            .next_back()
            .map_or(FIRST_SET_ID, |id| id + 1);
        self.next_id.max(FIRST_SET_ID).max(after_last)
    }
}

/// Capability interface for link set storage backends.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Store a new set of pending links and return its identifier.
    async fn save_links(&self, urls: &[String]) -> Result<SetId>;

    /// Point lookup of a single set.
    async fn get_link_set(&self, id: SetId) -> Option<LinkSet>;

    /// Batch lookup in request order; unknown ids are silently omitted.
    async fn get_link_sets(&self, ids: &[SetId]) -> Vec<LinkSet>;

    /// Replace the status of the link matching `url` after normalization.
    async fn update_link_status(&self, id: SetId, url: &str, status: LinkStatus) -> Result<()>;

    /// Every stored set, ordered by id.
    async fn get_all_sets(&self) -> Vec<LinkSet>;

    /// Persist a point-in-time image of the whole store.
    async fn backup(&self) -> Result<()>;

    /// Load the persisted image; a missing image is a fresh start.
    async fn restore(&self) -> Result<()>;
}
