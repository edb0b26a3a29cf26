//! Link set data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::normalize_url;

/// Identifier of a link set.
pub type SetId = u64;

/// Reachability status of a single link.
///
/// Encoded at every boundary as the lowercase tokens
/// `"pending"`, `"available"` and `"unavailable"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Not probed yet
    #[default]
    Pending,
    /// Probe got a response in [200, 400)
    Available,
    /// Probe failed, timed out or got any other status code
    Unavailable,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Available => "available",
            LinkStatus::Unavailable => "unavailable",
        }
    }

    /// Whether a probe has already resolved this status.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, LinkStatus::Pending)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored URL together with its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    /// Normalized URL
    pub url: String,

    /// Current status
    pub status: LinkStatus,
}

impl LinkResult {
    /// Wrap a raw URL as a pending result.
    pub fn pending(raw: &str) -> Self {
        Self {
            url: normalize_url(raw),
            status: LinkStatus::Pending,
        }
    }
}

/// Per-status link counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub available: usize,
    pub unavailable: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.available + self.unavailable
    }

    fn add(&mut self, status: LinkStatus) {
        match status {
            LinkStatus::Pending => self.pending += 1,
            LinkStatus::Available => self.available += 1,
            LinkStatus::Unavailable => self.unavailable += 1,
        }
    }
}

impl<'a> FromIterator<&'a LinkSet> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a LinkSet>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for set in iter {
            for link in &set.links {
                counts.add(link.status);
            }
        }
        counts
    }
}

/// A batch of URLs submitted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    /// Unique, monotonically assigned identifier
    pub id: SetId,

    /// Links in submission order
    pub links: Vec<LinkResult>,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every status mutation
    pub updated_at: DateTime<Utc>,
}

impl LinkSet {
    /// Build a fresh set with every URL normalized and pending.
    pub fn new<S: AsRef<str>>(id: SetId, urls: &[S], now: DateTime<Utc>) -> Self {
        Self {
            id,
            links: urls.iter().map(|u| LinkResult::pending(u.as_ref())).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Links still waiting for a probe result.
    pub fn pending_links(&self) -> impl Iterator<Item = &LinkResult> {
        self.links.iter().filter(|l| !l.status.is_resolved())
    }

    pub fn counts(&self) -> StatusCounts {
        std::iter::once(self).collect()
    }
}
