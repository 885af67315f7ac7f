//! Concurrent downloads with mirror fallback, checksum verification, and a
//! live status display.
//!
//! # Architecture
//!
//! - `client.rs` - One-URL fetch into memory with progress callbacks
//! - `state.rs` - Typed per-download state machine
//! - `supervisor.rs` - Bounded-parallel workers and error aggregation
//! - `pool.rs` - Shared runtime

pub use client::{Fetcher, DEFAULT_IDLE_TIMEOUT};
pub use error::{DownloadError, FetchError};
pub use state::DownloadState;
pub use supervisor::{download_all, DownloadRequest};

mod client;
mod error;
mod pool;
mod state;
mod supervisor;
