//! Batch ingestion of transaction logs
//!
//! A transaction on the source chain may emit any number of logs. Each one is
//! decoded and built on its own: an unrecognized log or a failed build is
//! recorded in the [`BatchReport`] and processing moves on to the next log.

use alloy_primitives::{Address, B256};
use alloy_rpc_types::{Log, TransactionReceipt};
use tracing::{debug, info};

use super::cctx_builder::CctxBuilder;
use crate::codec;
use crate::error::{BuildError, DecodeError};
use crate::protocol::Cctx;
use crate::spans;
use crate::traits::{AssetRegistry, CctxStore, GasPriceOracle, NativePool, NonceAssigner, NotificationSink};

/// Which decoded events a batch accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accept {
    All,
    WithdrawalsOnly,
}

/// Per-log outcome of ingesting one batch. Positions refer to the input slice.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub created: Vec<Cctx>,
    pub skipped: Vec<(usize, DecodeError)>,
    pub failed: Vec<(usize, BuildError)>,
}

impl BatchReport {
    /// Returns true if at least one built event should be retried later.
    pub fn has_retryable_failures(&self) -> bool {
        self.failed.iter().any(|(_, e)| e.is_retryable())
    }
}

impl<R, G, N, P, S, E> CctxBuilder<R, G, N, P, S, E>
where
    R: AssetRegistry,
    G: GasPriceOracle,
    N: NonceAssigner,
    P: NativePool,
    S: CctxStore,
    E: NotificationSink,
{
    /// Decodes and builds every log of a transaction.
    pub fn process_logs(&self, logs: &[Log], target: Address, origin: Address) -> BatchReport {
        self.process(logs, target, origin, None, Accept::All)
    }

    /// Like [`process_logs`](Self::process_logs), indexing every CCTX under a parent CCTX.
    pub fn process_logs_for_inbound(
        &self,
        logs: &[Log],
        target: Address,
        origin: Address,
        parent_index: B256,
    ) -> BatchReport {
        self.process(logs, target, origin, Some(parent_index), Accept::All)
    }

    /// Builds asset withdrawals only; any other log is skipped.
    pub fn process_withdrawal_logs(
        &self,
        logs: &[Log],
        contract: Address,
        origin: Address,
    ) -> BatchReport {
        self.process(logs, contract, origin, None, Accept::WithdrawalsOnly)
    }

    /// Ingests a transaction receipt.
    ///
    /// The target is the transaction's `to` address, or the created contract for
    /// deployments; the origin is the transaction sender.
    pub fn process_receipt(&self, receipt: &TransactionReceipt) -> BatchReport {
        let target = receipt_target(receipt.to, receipt.contract_address);
        self.process_logs(receipt.inner.logs(), target, receipt.from)
    }

    fn process(
        &self,
        logs: &[Log],
        target: Address,
        origin: Address,
        parent_index: Option<B256>,
        accept: Accept,
    ) -> BatchReport {
        let span = spans::process_logs(&target, &origin, logs.len());
        let _guard = span.enter();

        let mut report = BatchReport::default();
        for (position, log) in logs.iter().enumerate() {
            let decoded = match accept {
                Accept::All => codec::decode(log),
                Accept::WithdrawalsOnly => codec::WITHDRAWAL_DECODER.try_decode(log),
            };
            let event = match decoded {
                Ok(event) => event,
                Err(e) => {
                    debug!(position = position, error = %e, event = "log_skipped");
                    report.skipped.push((position, e));
                    continue;
                }
            };

            let built = match parent_index {
                Some(parent) => self.build_for_inbound(&event, target, origin, parent),
                None => self.build(&event, target, origin),
            };
            match built {
                Ok(cctx) => report.created.push(cctx),
                Err(e) => report.failed.push((position, e)),
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            event = "log_batch_processed"
        );
        report
    }
}

fn receipt_target(to: Option<Address>, contract_address: Option<Address>) -> Address {
    to.or(contract_address).unwrap_or(Address::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use rstest::rstest;

    const CALLEE: Address = address!("0x1111111111111111111111111111111111111111");
    const CREATED: Address = address!("0x2222222222222222222222222222222222222222");

    #[rstest]
    #[case::call(Some(CALLEE), None, CALLEE)]
    #[case::deployment(None, Some(CREATED), CREATED)]
    #[case::neither(None, None, Address::ZERO)]
    fn test_receipt_target(
        #[case] to: Option<Address>,
        #[case] contract_address: Option<Address>,
        #[case] expected: Address,
    ) {
        assert_eq!(receipt_target(to, contract_address), expected);
    }

    #[test]
    fn test_retryable_failures() {
        let mut report = BatchReport::default();
        report.failed.push((
            0,
            BuildError::AlreadyExists {
                index: B256::ZERO,
            },
        ));
        assert!(!report.has_retryable_failures());

        report.failed.push((
            1,
            BuildError::UnknownAsset {
                contract: Address::ZERO,
            },
        ));
        assert!(report.has_retryable_failures());
    }
}
