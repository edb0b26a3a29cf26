// src/lib.rs

//! Link checker library.
//!
//! Accepts batches of URLs as link sets, probes each URL's reachability on a
//! fixed worker pool and keeps the evolving status in a snapshot-backed store.

pub mod api;
pub mod error;
pub mod models;
pub mod report;
pub mod services;
pub mod storage;
pub mod utils;
