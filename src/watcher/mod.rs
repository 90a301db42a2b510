//! Confirmation wait for relayed transfers
//!
//! Given the hash of an inbound transaction, [`StatusWatcher`] finds every CCTX
//! it produced and polls each one concurrently until it reaches a terminal status.

mod config;
mod status_watcher;

pub use config::{WatchConfig, DEFAULT_POLL_INTERVAL, DEFAULT_RESOLVE_INTERVAL};
pub use status_watcher::{StatusWatcher, TerminalStream};
