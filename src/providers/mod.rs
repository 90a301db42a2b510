//! Implementations of the relay's collaborator traits.
//!
//! In-memory ledger, registry, oracle, nonce service and pool suitable for a
//! single-process relay, a REST client for a remote ledger, and the Tokio clock.
//! Test fakes live in [`crate::testing`].

mod memory;
mod nonce;
mod pool;
mod registry;
mod rest;
mod tokio_clock;

pub use self::memory::MemoryLedger;
pub use self::nonce::ChainNonces;
pub use self::pool::ModulePool;
pub use self::registry::{StaticAssetRegistry, StaticGasOracle};
pub use self::rest::{RestCctxQueryClient, CCTX_PATH, INBOUND_HASH_PATH};
pub use self::tokio_clock::TokioClock;
