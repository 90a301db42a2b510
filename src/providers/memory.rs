//! In-memory ledger.

use alloy_primitives::B256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::error::{LedgerError, QueryError};
use crate::protocol::{Cctx, Status};
use crate::traits::{CctxQueryClient, CctxStore};

#[derive(Debug, Default)]
struct LedgerState {
    cctxs: HashMap<B256, Cctx>,
    inbound_index: HashMap<B256, Vec<B256>>,
}

/// Keyed CCTX store with an inbound-hash index.
///
/// Records and index live under one lock, so a reader sees a stored record and
/// its index entry together or not at all. Clones share the same state.
///
/// # Examples
///
/// ```rust
/// use cctx_relay::providers::MemoryLedger;
/// use cctx_relay::CctxStore;
/// use alloy_primitives::B256;
///
/// let ledger = MemoryLedger::new();
/// assert!(!ledger.contains(&B256::ZERO));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a status update from the outbound-execution side.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown indexes and
    /// [`LedgerError::Status`] if the record is already terminal.
    pub fn update_status(
        &self,
        index: B256,
        status: Status,
        message: impl Into<String>,
    ) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        let cctx = state
            .cctxs
            .get_mut(&index)
            .ok_or(LedgerError::NotFound { index })?;
        cctx.transition(status, message)?;
        info!(index = %index, status = %status, event = "cctx_status_updated");
        Ok(())
    }

    /// Indexes stored under an inbound hash, in insertion order.
    pub fn indexes_for(&self, inbound_hash: &B256) -> Vec<B256> {
        self.read()
            .map(|state| state.inbound_index.get(inbound_hash).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|state| state.cctxs.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.state
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.state
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))
    }
}

impl CctxStore for MemoryLedger {
    fn get(&self, index: &B256) -> Option<Cctx> {
        self.read().ok()?.cctxs.get(index).cloned()
    }

    fn insert_with_index(&self, cctx: &Cctx) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        let index = cctx.index();
        if state.cctxs.contains_key(&index) {
            return Err(LedgerError::DuplicateIndex { index });
        }

        let indexes = state
            .inbound_index
            .entry(cctx.inbound().observed_hash)
            .or_default();
        if !indexes.contains(&index) {
            indexes.push(index);
        }
        state.cctxs.insert(index, cctx.clone());

        debug!(
            index = %index,
            inbound_hash = %cctx.inbound().observed_hash,
            event = "cctx_stored"
        );
        Ok(())
    }
}

#[async_trait]
impl CctxQueryClient for MemoryLedger {
    async fn cctx(&self, index: B256) -> Result<Cctx, QueryError> {
        self.get(&index).ok_or(QueryError::NotFound { key: index })
    }

    async fn inbound_hash_to_cctx(&self, inbound_hash: B256) -> Result<Vec<B256>, QueryError> {
        let indexes = self.indexes_for(&inbound_hash);
        if indexes.is_empty() {
            return Err(QueryError::NotFound { key: inbound_hash });
        }
        Ok(indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CoinClass, InboundParams, OutboundParams};
    use alloy_chains::Chain;
    use alloy_primitives::{Address, Bytes, U256};

    fn cctx(index: u8, inbound_hash: B256) -> Cctx {
        Cctx::new_pending(
            B256::repeat_byte(index),
            CoinClass::Gas,
            U256::from(10u64),
            Bytes::new(),
            InboundParams {
                sender: Address::ZERO,
                source_chain: Chain::from_id(7001),
                tx_origin: Address::ZERO,
                observed_hash: inbound_hash,
                observed_block_height: 1,
                log_index: index as u64,
            },
            OutboundParams {
                recipient: Bytes::from(vec![1u8; 20]),
                destination_chain: Chain::from_id(5),
                gas_limit: 90_000,
                gas_price: 1,
                nonce: index as u64,
            },
        )
    }

    #[test]
    fn test_insert_indexes_by_inbound_hash() {
        let ledger = MemoryLedger::new();
        let inbound = B256::repeat_byte(0xaa);

        ledger.insert_with_index(&cctx(1, inbound)).unwrap();
        ledger.insert_with_index(&cctx(2, inbound)).unwrap();

        assert_eq!(
            ledger.indexes_for(&inbound),
            vec![B256::repeat_byte(1), B256::repeat_byte(2)]
        );
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_duplicate_index_is_rejected() {
        let ledger = MemoryLedger::new();
        let record = cctx(1, B256::repeat_byte(0xaa));

        ledger.insert_with_index(&record).unwrap();
        let err = ledger.insert_with_index(&record).unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateIndex { index } if index == record.index()));
        assert_eq!(ledger.indexes_for(&B256::repeat_byte(0xaa)).len(), 1);
    }

    #[test]
    fn test_update_status_is_monotonic() {
        let ledger = MemoryLedger::new();
        let record = cctx(1, B256::repeat_byte(0xaa));
        ledger.insert_with_index(&record).unwrap();

        ledger
            .update_status(record.index(), Status::Aborted, "insufficient gas")
            .unwrap();
        let err = ledger
            .update_status(record.index(), Status::OutboundMined, "mined")
            .unwrap_err();

        assert!(matches!(err, LedgerError::Status(_)));
        assert_eq!(
            ledger.get(&record.index()).unwrap().status().status,
            Status::Aborted
        );
    }

    #[test]
    fn test_update_unknown_index() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .update_status(B256::ZERO, Status::OutboundMined, "mined")
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_client_not_found() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.inbound_hash_to_cctx(B256::ZERO).await,
            Err(QueryError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.cctx(B256::ZERO).await,
            Err(QueryError::NotFound { .. })
        ));
    }
}
