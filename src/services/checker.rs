// src/services/checker.rs

//! Link checker supervisor.
//!
//! Owns the task queue and a fixed pool of probe workers. Lifecycle:
//!
//! ```text
//! Stopped -> Starting -> Running -> Stopping -> Stopped
//! ```
//!
//! Cancellation is cooperative: workers notice it between tasks and an
//! in-flight probe always runs to completion or to its own timeout.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::models::{CheckerConfig, SetId};
use crate::services::probe::Probe;
use crate::services::queue::{CheckTask, EnqueueReport, TaskQueue};
use crate::storage::LinkStore;

/// Lifecycle state of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for CheckerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckerState::Stopped => "stopped",
            CheckerState::Starting => "starting",
            CheckerState::Running => "running",
            CheckerState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

struct Lifecycle {
    state: CheckerState,
    queue: TaskQueue,
    cancel: Option<CancellationToken>,
    tasks: Vec<JoinHandle<()>>,
}

/// Starts and stops the worker pool and accepts check requests.
pub struct LinkChecker {
    store: Arc<dyn LinkStore>,
    probe: Arc<dyn Probe>,
    workers: usize,
    queue_capacity: usize,
    sweep_interval: Option<Duration>,
    lifecycle: Mutex<Lifecycle>,
}

impl LinkChecker {
    /// Create a stopped checker sized from the configuration.
    pub fn new(store: Arc<dyn LinkStore>, probe: Arc<dyn Probe>, config: &CheckerConfig) -> Self {
        let queue_capacity = config.queue_capacity.max(1);
        Self {
            store,
            probe,
            workers: config.workers.max(1),
            queue_capacity,
            sweep_interval: config.sweep_interval(),
            lifecycle: Mutex::new(Lifecycle {
                state: CheckerState::Stopped,
                queue: TaskQueue::bounded(queue_capacity),
                cancel: None,
                tasks: Vec::new(),
            }),
        }
    }

    /// Override the sweep interval; `None` disables the sweep.
    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> CheckerState {
        self.lock().state
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Spawn the worker pool (and the sweep, if enabled).
    ///
    /// Must be called from within a Tokio runtime. No-op unless stopped.
    pub fn start(&self) {
        let mut lifecycle = self.lock();
        if lifecycle.state != CheckerState::Stopped {
            log::info!("LinkChecker already {}", lifecycle.state);
            return;
        }
        lifecycle.state = CheckerState::Starting;

        if lifecycle.queue.is_closed() {
            lifecycle.queue = TaskQueue::bounded(self.queue_capacity);
        }

        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(self.workers + 1);
        for worker_id in 0..self.workers {
            tasks.push(tokio::spawn(run_worker(
                worker_id,
                lifecycle.queue.clone(),
                Arc::clone(&self.store),
                Arc::clone(&self.probe),
                cancel.clone(),
            )));
        }
        if let Some(interval) = self.sweep_interval {
            tasks.push(tokio::spawn(run_sweep(
                interval,
                lifecycle.queue.clone(),
                Arc::clone(&self.store),
                cancel.clone(),
            )));
        }

        lifecycle.cancel = Some(cancel);
        lifecycle.tasks = tasks;
        lifecycle.state = CheckerState::Running;
        log::info!("LinkChecker running with {} workers", self.workers);
    }

    /// Cancel the workers, close the queue and wait for every worker to exit.
    ///
    /// No-op unless running. In-flight probes are not aborted.
    pub async fn stop(&self) {
        let (cancel, tasks, queue) = {
            let mut lifecycle = self.lock();
            if lifecycle.state != CheckerState::Running {
                log::debug!("LinkChecker stop ignored while {}", lifecycle.state);
                return;
            }
            lifecycle.state = CheckerState::Stopping;
            (
                lifecycle.cancel.take(),
                std::mem::take(&mut lifecycle.tasks),
                lifecycle.queue.clone(),
            )
        };

        log::info!("LinkChecker stopping...");
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        queue.close();

        for result in join_all(tasks).await {
            if let Err(e) = result {
                log::error!("LinkChecker task ended abnormally: {}", e);
            }
        }
        if !queue.is_empty() {
            log::info!("{} queued tasks left pending for the next sweep", queue.len());
        }

        self.lock().state = CheckerState::Stopped;
        log::info!("LinkChecker stopped");
    }

    /// Offer every URL of a freshly saved set to the workers.
    ///
    /// Best effort: URLs that do not fit in the queue are dropped and left
    /// for the sweep.
    pub fn check_links_async<S: AsRef<str>>(&self, set_id: SetId, urls: &[S]) -> EnqueueReport {
        let queue = self.lock().queue.clone();
        let report = queue.try_enqueue_all(set_id, urls);
        if report.dropped > 0 || report.rejected > 0 {
            log::warn!(
                "LinkChecker is busy: set {} queued {}, dropped {}, rejected {}",
                set_id,
                report.queued,
                report.dropped,
                report.rejected
            );
        } else {
            log::debug!("Queued {} links of set {}", report.queued, set_id);
        }
        report
    }

    /// Re-offer every link that is still pending.
    pub async fn sweep(&self) -> EnqueueReport {
        let queue = self.lock().queue.clone();
        sweep_pending(self.store.as_ref(), &queue).await
    }
}

/// Enqueue every pending link in the store without waiting for room.
pub async fn sweep_pending(store: &dyn LinkStore, queue: &TaskQueue) -> EnqueueReport {
    let mut report = EnqueueReport::default();
    for set in store.get_all_sets().await {
        for link in set.pending_links() {
            report.record(queue.try_enqueue(CheckTask::new(set.id, link.url.as_str())));
        }
    }
    if report.total() > 0 {
        log::debug!(
            "Sweep queued {}, dropped {}, rejected {}",
            report.queued,
            report.dropped,
            report.rejected
        );
    }
    report
}

async fn run_worker(
    worker_id: usize,
    queue: TaskQueue,
    store: Arc<dyn LinkStore>,
    probe: Arc<dyn Probe>,
    cancel: CancellationToken,
) {
    log::debug!("Worker {} started", worker_id);
    loop {
        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            task = queue.dequeue() => match task {
                Some(task) => task,
                None => break,
            },
        };
        process_task(store.as_ref(), probe.as_ref(), task).await;
    }
    log::debug!("Worker {} stopped", worker_id);
}

/// Probe one task and write the result back. Failures end only this task.
async fn process_task(store: &dyn LinkStore, probe: &dyn Probe, task: CheckTask) {
    let status = probe.probe(&task.url).await;
    log::debug!("Checked set {} url {} -> {}", task.set_id, task.url, status);

    if let Err(e) = store
        .update_link_status(task.set_id, &task.url, status)
        .await
    {
        if e.is_not_found() {
            log::warn!("Task out of sync with store, discarding: {}", e);
        } else {
            log::error!("Cannot record result for set {}: {}", task.set_id, e);
        }
    }
}

async fn run_sweep(
    interval: Duration,
    queue: TaskQueue,
    store: Arc<dyn LinkStore>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                sweep_pending(store.as_ref(), &queue).await;
            }
        }
    }
    log::debug!("Sweep stopped");
}
