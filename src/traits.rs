//! Core trait abstractions for the relay's collaborators.
//!
//! The relay consumes the ledger, the asset registry, the gas-price oracle, the
//! nonce service, the native pool, the notification channel and time through
//! these traits. In-memory implementations live in [`crate::providers`]; test
//! fakes live in [`crate::testing`].
//!
//! # Example: Implementing a Gas Price Oracle
//!
//! ```rust
//! use cctx_relay::{GasPrice, GasPriceOracle};
//! use alloy_chains::Chain;
//!
//! struct FlatOracle(u64);
//!
//! impl GasPriceOracle for FlatOracle {
//!     fn gas_price(&self, chain: Chain) -> Option<GasPrice> {
//!         Some(GasPrice::single(chain, self.0))
//!     }
//! }
//! ```

use alloy_chains::Chain;
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::error::{LedgerError, PoolError, QueryError};
use crate::notify::CctxEvent;
use crate::protocol::{AssetMetadata, Cctx, GasPrice};

/// Read-only lookup of bridged assets by contract address.
pub trait AssetRegistry: Send + Sync {
    /// Returns the entry registered for `contract`, enabled or not.
    fn asset(&self, contract: Address) -> Option<AssetMetadata>;

    /// Lists every enabled asset.
    fn enabled_assets(&self) -> Vec<AssetMetadata>;

    /// Returns the entry for `contract` only if it is enabled.
    fn enabled_asset(&self, contract: Address) -> Option<AssetMetadata> {
        self.asset(contract).filter(|asset| asset.enabled)
    }
}

/// Source of the current gas price for a destination chain.
pub trait GasPriceOracle: Send + Sync {
    /// Returns `None` if no price has been published for `chain`.
    fn gas_price(&self, chain: Chain) -> Option<GasPrice>;
}

/// Hands out outbound nonces per destination chain.
///
/// Implementations must be atomic per chain: concurrent callers never receive
/// the same nonce and no nonce is skipped.
pub trait NonceAssigner: Send + Sync {
    fn next_nonce(&self, chain: Chain) -> u64;

    /// Next nonce that would be handed out, without consuming it.
    fn peek_nonce(&self, chain: Chain) -> u64;
}

/// Module-owned pool of the native coin that transfer-outs burn from.
pub trait NativePool: Send + Sync {
    fn burn(&self, amount: U256) -> Result<(), PoolError>;

    /// Returns burnt value to the pool when the CCTX it paid for was not stored.
    fn refund(&self, amount: U256) -> Result<(), PoolError>;
}

/// Write side of the ledger.
pub trait CctxStore: Send + Sync {
    fn get(&self, index: &B256) -> Option<Cctx>;

    fn contains(&self, index: &B256) -> bool {
        self.get(index).is_some()
    }

    /// Stores the record and appends it to the index of its observed inbound hash.
    ///
    /// Both writes become visible together or not at all. A record whose index
    /// is already stored is rejected with [`LedgerError::DuplicateIndex`].
    fn insert_with_index(&self, cctx: &Cctx) -> Result<(), LedgerError>;
}

/// Read side of the ledger, typically a remote query client.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Index not yet populated
/// - Transport failures between successful responses
/// - Status progressions ending in each terminal status
#[async_trait]
pub trait CctxQueryClient: Send + Sync {
    /// Fetches the current record for a CCTX index.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] for unknown indexes and a transport error
    /// if the ledger cannot be reached.
    async fn cctx(&self, index: B256) -> Result<Cctx, QueryError>;

    /// Fetches every CCTX index produced by an inbound transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] if nothing has been indexed yet.
    async fn inbound_hash_to_cctx(&self, inbound_hash: B256) -> Result<Vec<B256>, QueryError>;
}

/// Append-only channel for relay notifications. Delivery is fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: CctxEvent);
}

/// Trait for time-based operations.
///
/// Abstracts sleep and time queries so tests can advance through polling loops
/// and deadlines without actually waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;
}
