// src/services/queue.rs

//! Bounded task queue between producers and probe workers.
//!
//! Producers never wait for room: a task that does not fit is dropped and
//! the link stays pending until the next sweep offers it again.

use async_channel::{Receiver, Sender, TrySendError};

use crate::models::SetId;

/// A single check request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTask {
    pub set_id: SetId,
    /// URL as submitted; workers normalize it themselves
    pub url: String,
}

impl CheckTask {
    pub fn new(set_id: SetId, url: impl Into<String>) -> Self {
        Self {
            set_id,
            url: url.into(),
        }
    }
}

/// Outcome of a non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Queue was full, the task was discarded
    Dropped,
    /// Queue no longer accepts tasks
    Closed,
}

/// Tally of a batch of enqueue attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueReport {
    pub queued: usize,
    pub dropped: usize,
    pub rejected: usize,
}

impl EnqueueReport {
    pub fn record(&mut self, outcome: EnqueueOutcome) {
        match outcome {
            EnqueueOutcome::Queued => self.queued += 1,
            EnqueueOutcome::Dropped => self.dropped += 1,
            EnqueueOutcome::Closed => self.rejected += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.queued + self.dropped + self.rejected
    }
}

/// Multi-producer, multi-consumer bounded queue of check tasks.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: Sender<CheckTask>,
    rx: Receiver<CheckTask>,
}

impl TaskQueue {
    /// Create a queue holding at most `capacity` tasks.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Offer a task without waiting.
    pub fn try_enqueue(&self, task: CheckTask) -> EnqueueOutcome {
        match self.tx.try_send(task) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(TrySendError::Full(task)) => {
                log::warn!(
                    "Task queue full, dropping set {} url {}",
                    task.set_id,
                    task.url
                );
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(task)) => {
                log::warn!(
                    "Task queue closed, rejecting set {} url {}",
                    task.set_id,
                    task.url
                );
                EnqueueOutcome::Closed
            }
        }
    }

    /// Offer every URL of a set without waiting.
    pub fn try_enqueue_all<S: AsRef<str>>(&self, set_id: SetId, urls: &[S]) -> EnqueueReport {
        let mut report = EnqueueReport::default();
        for url in urls {
            report.record(self.try_enqueue(CheckTask::new(set_id, url.as_ref())));
        }
        report
    }

    /// Wait for the next task; `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<CheckTask> {
        self.rx.recv().await.ok()
    }

    /// Stop accepting tasks. Returns false if it was already closed.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}
