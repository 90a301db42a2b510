//! Per-chain outbound nonce counters.

use alloy_chains::Chain;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::traits::NonceAssigner;

/// Nonce service keyed by destination chain.
///
/// Each chain starts at zero. Counters live behind a single mutex, so the
/// read-increment-write of [`next_nonce`](NonceAssigner::next_nonce) is atomic
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct ChainNonces {
    counters: Arc<Mutex<HashMap<Chain, u64>>>,
}

impl ChainNonces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `chain` at `nonce`, e.g. when resuming from persisted state.
    pub fn with_start(self, chain: Chain, nonce: u64) -> Self {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chain, nonce);
        self
    }
}

impl NonceAssigner for ChainNonces {
    fn next_nonce(&self, chain: Chain) -> u64 {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(chain).or_insert(0);
        let nonce = *counter;
        *counter += 1;
        nonce
    }

    fn peek_nonce(&self, chain: Chain) -> u64 {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chain)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_nonces_are_per_chain() {
        let nonces = ChainNonces::new();
        let bsc = Chain::from_id(97);
        let goerli = Chain::from_id(5);

        assert_eq!(nonces.next_nonce(bsc), 0);
        assert_eq!(nonces.next_nonce(bsc), 1);
        assert_eq!(nonces.next_nonce(goerli), 0);
        assert_eq!(nonces.peek_nonce(bsc), 2);
        assert_eq!(nonces.peek_nonce(goerli), 1);
    }

    #[test]
    fn test_with_start() {
        let chain = Chain::from_id(97);
        let nonces = ChainNonces::new().with_start(chain, 41);
        assert_eq!(nonces.next_nonce(chain), 41);
        assert_eq!(nonces.peek_nonce(chain), 42);
    }

    #[test]
    fn test_concurrent_callers_get_distinct_contiguous_nonces() {
        let nonces = ChainNonces::new();
        let chain = Chain::from_id(97);

        let handed_out: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let nonces = nonces.clone();
                    scope.spawn(move || {
                        (0..50).map(|_| nonces.next_nonce(chain)).collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let unique: HashSet<u64> = handed_out.iter().copied().collect();
        assert_eq!(unique.len(), 400);
        assert_eq!(unique, (0..400).collect::<HashSet<_>>());
    }
}
