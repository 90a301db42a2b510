//! CCTX construction
//!
//! This module turns decoded chain events into stored CCTX records and drives
//! batch ingestion of transaction logs.

mod cctx_builder;
mod config;
mod ingest;

pub use cctx_builder::CctxBuilder;
pub use config::{RelayConfig, DEFAULT_OUTBOUND_GAS_LIMIT, DEFAULT_SOURCE_CHAIN_ID};
pub use ingest::BatchReport;
