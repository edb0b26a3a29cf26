//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{LinkSet, LinkStatus, SetId};

/// Body of `POST /api/check`.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub links: Vec<String>,
}

/// Body of `POST /api/report`.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub links_list: Vec<SetId>,
}

/// Status of every link in a set, keyed by URL in set order.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub links: Map<String, Value>,
    pub links_num: SetId,
}

impl CheckResponse {
    /// Response for a freshly saved set, keyed by the URLs as submitted.
    pub fn pending(id: SetId, submitted: &[String]) -> Self {
        let links = submitted
            .iter()
            .map(|url| (url.clone(), Value::from(LinkStatus::Pending.as_str())))
            .collect();
        Self {
            links,
            links_num: id,
        }
    }
}

impl From<&LinkSet> for CheckResponse {
    fn from(set: &LinkSet) -> Self {
        let links = set
            .links
            .iter()
            .map(|link| (link.url.clone(), Value::from(link.status.as_str())))
            .collect();
        Self {
            links,
            links_num: set.id,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 timestamp
    pub time: String,
}
