//! # cctx-relay
//!
//! Relay core for cross-chain transactions (CCTX) leaving a bridge chain.
//!
//! Logs emitted on the bridge chain are decoded into typed events, each event
//! is turned into a stored CCTX record with a destination chain, gas price and
//! outbound nonce, and callers can wait until every CCTX produced by an inbound
//! transaction has reached a terminal status.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cctx_relay::providers::{
//!     ChainNonces, MemoryLedger, ModulePool, StaticAssetRegistry, StaticGasOracle, TokioClock,
//! };
//! use cctx_relay::{
//!     AssetMetadata, CctxBuilder, CoinClass, RelayConfig, StatusWatcher, TracingSink, WatchConfig,
//! };
//! use alloy_chains::Chain;
//! use alloy_primitives::address;
//! use alloy_rpc_types::TransactionReceipt;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(receipt: TransactionReceipt) -> Result<(), Box<dyn std::error::Error>> {
//! let bsc_testnet = Chain::from_id(97);
//! let registry = StaticAssetRegistry::new().register(AssetMetadata::new(
//!     address!("0x13A0c5930C028511Dc02665E7285134B6d11A5f4"),
//!     bsc_testnet,
//!     CoinClass::Gas,
//!     "tBNB",
//! ));
//!
//! let ledger = MemoryLedger::new();
//! let builder = CctxBuilder::builder()
//!     .registry(registry)
//!     .gas_oracle(StaticGasOracle::new().with_price(bsc_testnet, 10_000_000_000))
//!     .nonces(ChainNonces::new())
//!     .pool(ModulePool::default())
//!     .store(ledger.clone())
//!     .sink(TracingSink)
//!     .config(RelayConfig::from_env()?)
//!     .build();
//!
//! // Decode and build every log of the transaction
//! let report = builder.process_receipt(&receipt);
//! println!("{} CCTX created", report.created.len());
//!
//! // Wait for the outbound side to finish them
//! let watcher = StatusWatcher::builder()
//!     .client(Arc::new(ledger))
//!     .clock(Arc::new(TokioClock::new()))
//!     .config(WatchConfig::default().with_timeout(std::time::Duration::from_secs(600)))
//!     .build();
//! let cctxs = watcher
//!     .await_terminal(receipt.transaction_hash, CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`codec`] - Log decoding into [`ChainEvent`]s
//! - [`CctxBuilder`] - CCTX construction and batch ingestion
//! - [`StatusWatcher`] - Confirmation wait on an inbound hash
//! - [`providers`] - In-memory and REST implementations of the collaborator traits
//! - [`DecodeError`], [`BuildError`] and [`WatchError`] - Error types per stage

mod builder;
mod contracts;
mod error;
mod notify;
mod protocol;
mod traits;
mod watcher;

pub mod codec;
pub mod providers;
pub mod testing;

pub use builder::{
    BatchReport, CctxBuilder, RelayConfig, DEFAULT_OUTBOUND_GAS_LIMIT, DEFAULT_SOURCE_CHAIN_ID,
};
pub use contracts::{connector::ZetaConnector, zrc20::ZRC20};
pub use error::{
    BuildError, ConfigError, DecodeError, LedgerError, PoolError, QueryError, Result,
    StatusError, WatchError,
};
pub use notify::{CctxEvent, ChannelSink, CreatedCctx, TracingSink};
pub use protocol::{
    AssetMetadata, AssetWithdrawal, CanonicalMessage, Cctx, CctxStatus, ChainEvent, CoinClass,
    GasPrice, InboundParams, LogOrigin, NativeTransferOut, OutboundParams, Status,
};
pub use traits::{
    AssetRegistry, CctxQueryClient, CctxStore, Clock, GasPriceOracle, NativePool, NonceAssigner,
    NotificationSink,
};
pub use watcher::{
    StatusWatcher, TerminalStream, WatchConfig, DEFAULT_POLL_INTERVAL, DEFAULT_RESOLVE_INTERVAL,
};

// Public module for advanced users who need custom instrumentation
pub mod spans;
