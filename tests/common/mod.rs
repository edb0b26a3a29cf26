#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use linkcheck::models::{CheckerConfig, LinkStatus, SetId};
use linkcheck::services::{LinkChecker, Probe};
use linkcheck::storage::{FileStore, LinkStore};
use linkcheck::utils::normalize_url;
use tempfile::TempDir;

/// Probe answering from a fixed table; unknown URLs behave like a refused
/// connection.
pub struct MockProbe {
    answers: HashMap<String, LinkStatus>,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn new(answers: &[(&str, LinkStatus)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(url, status)| (normalize_url(url), *status))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for MockProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(&normalize_url(url))
            .copied()
            .unwrap_or(LinkStatus::Unavailable)
    }
}

pub fn checker_config(workers: usize, queue_capacity: usize) -> CheckerConfig {
    CheckerConfig {
        workers,
        queue_capacity,
        sweep_interval_secs: 0,
        ..CheckerConfig::default()
    }
}

pub fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub struct Harness {
    pub tmp: TempDir,
    pub store: Arc<FileStore>,
    pub probe: Arc<MockProbe>,
    pub checker: Arc<LinkChecker>,
}

impl Harness {
    pub fn new(probe: MockProbe, config: &CheckerConfig) -> Self {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(tmp.path().join("storage.json")));
        let probe = Arc::new(probe);
        let checker = Arc::new(LinkChecker::new(store.clone(), probe.clone(), config));
        Self {
            tmp,
            store,
            probe,
            checker,
        }
    }

    pub fn snapshot_path(&self) -> std::path::PathBuf {
        self.tmp.path().join("storage.json")
    }
}

/// Wait until every link of the set has left `Pending`.
pub async fn wait_resolved(store: &dyn LinkStore, id: SetId) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let set = store.get_link_set(id).await.unwrap();
            if set.pending_links().count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("links were not resolved in time");
}
