//! Service layer for the link checker.
//!
//! This module contains the concurrent status pipeline:
//! - Bounded task queue (`TaskQueue`)
//! - Reachability probes (`Probe`, `HttpProbe`)
//! - Worker pool supervisor (`LinkChecker`)

pub mod checker;
pub mod probe;
pub mod queue;

pub use checker::{CheckerState, LinkChecker, sweep_pending};
pub use probe::{HttpProbe, Probe, classify_status};
pub use queue::{CheckTask, EnqueueOutcome, EnqueueReport, TaskQueue};
