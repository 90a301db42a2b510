//! Event codec
//!
//! Turns raw source-chain logs into typed [`ChainEvent`]s. Decoders are tried in a
//! fixed priority order (asset withdrawal before native transfer-out); a signature
//! mismatch only means "try the next decoder", while a log whose signature
//! matched but whose payload does not decode is reported as malformed.
//!
//! # Example
//!
//! ```rust
//! use cctx_relay::codec;
//! use alloy_rpc_types::Log;
//!
//! let logs: Vec<Log> = Vec::new();
//! for (position, result) in codec::decode_batch(&logs).into_iter().enumerate() {
//!     match result {
//!         Ok(event) => println!("log {position}: {}", event.kind()),
//!         Err(e) => println!("log {position} skipped: {e}"),
//!     }
//! }
//! ```

use alloy_primitives::B256;
use alloy_rpc_types::Log;
use alloy_sol_types::SolEvent;
use tracing::{debug, trace};

use crate::contracts::connector::ZetaConnector::ZetaSent;
use crate::contracts::zrc20::ZRC20::Withdrawal;
use crate::error::DecodeError;
use crate::protocol::{AssetWithdrawal, ChainEvent, LogOrigin, NativeTransferOut};
use crate::spans;

/// A single decode attempt for one event type.
#[derive(Debug, Clone, Copy)]
pub struct EventDecoder {
    pub event: &'static str,
    pub signature_hash: B256,
    decode: fn(&Log, LogOrigin) -> Result<ChainEvent, DecodeError>,
}

impl EventDecoder {
    /// Decodes `log` if its first topic carries this decoder's signature.
    pub fn try_decode(&self, log: &Log) -> Result<ChainEvent, DecodeError> {
        let topic = *log.inner.data.topics().first().ok_or(DecodeError::MissingTopic)?;
        if topic != self.signature_hash {
            return Err(DecodeError::SignatureMismatch {
                event: self.event,
                topic,
            });
        }
        let origin = log_origin(log)?;
        (self.decode)(log, origin)
    }
}

/// Decoders in the order they are tried.
pub const DECODERS: [EventDecoder; 2] = [
    EventDecoder {
        event: "Withdrawal",
        signature_hash: Withdrawal::SIGNATURE_HASH,
        decode: decode_withdrawal,
    },
    EventDecoder {
        event: "ZetaSent",
        signature_hash: ZetaSent::SIGNATURE_HASH,
        decode: decode_zeta_sent,
    },
];

/// Decoder for ZRC20 withdrawals alone.
pub const WITHDRAWAL_DECODER: EventDecoder = DECODERS[0];

/// Decodes a log into the first event type whose signature matches.
///
/// # Errors
///
/// - [`DecodeError::MissingTopic`] if the log has no topics
/// - [`DecodeError::Unrecognized`] if no decoder matches the first topic
/// - [`DecodeError::MalformedPayload`] if a signature matched but the payload is invalid
/// - [`DecodeError::IncompleteLog`] if the log lacks its transaction hash, block
///   number or log index
pub fn decode(log: &Log) -> Result<ChainEvent, DecodeError> {
    let topic = *log.inner.data.topics().first().ok_or(DecodeError::MissingTopic)?;
    let span = spans::decode_log(&log.inner.address, &topic);
    let _guard = span.enter();

    for decoder in &DECODERS {
        match decoder.try_decode(log) {
            Ok(event) => {
                trace!(kind = event.kind(), event = "log_decoded");
                return Ok(event);
            }
            Err(e) if e.is_signature_mismatch() => continue,
            Err(e) => {
                spans::record_error(&e);
                return Err(e);
            }
        }
    }

    debug!(topic = %topic, event = "log_unrecognized");
    Err(DecodeError::Unrecognized { topic })
}

/// Decodes every log independently; a bad log never affects its siblings.
pub fn decode_batch(logs: &[Log]) -> Vec<Result<ChainEvent, DecodeError>> {
    logs.iter().map(decode).collect()
}

fn log_origin(log: &Log) -> Result<LogOrigin, DecodeError> {
    Ok(LogOrigin {
        contract: log.inner.address,
        tx_hash: log.transaction_hash.ok_or(DecodeError::IncompleteLog {
            field: "transaction hash",
        })?,
        block_height: log.block_number.ok_or(DecodeError::IncompleteLog {
            field: "block number",
        })?,
        log_index: log.log_index.ok_or(DecodeError::IncompleteLog { field: "log index" })?,
    })
}

fn decode_withdrawal(log: &Log, origin: LogOrigin) -> Result<ChainEvent, DecodeError> {
    let decoded = Withdrawal::decode_raw_log(
        log.inner.data.topics().iter().copied(),
        &log.inner.data.data,
    )
    .map_err(|e| DecodeError::MalformedPayload {
        event: "Withdrawal",
        reason: e.to_string(),
    })?;

    Ok(ChainEvent::AssetWithdrawal(AssetWithdrawal {
        origin,
        sender: decoded.from,
        recipient: decoded.to,
        amount: decoded.value,
    }))
}

fn decode_zeta_sent(log: &Log, origin: LogOrigin) -> Result<ChainEvent, DecodeError> {
    let decoded = ZetaSent::decode_raw_log(
        log.inner.data.topics().iter().copied(),
        &log.inner.data.data,
    )
    .map_err(|e| DecodeError::MalformedPayload {
        event: "ZetaSent",
        reason: e.to_string(),
    })?;

    Ok(ChainEvent::NativeTransferOut(NativeTransferOut {
        origin,
        sender: decoded.sender,
        destination_chain_id: decoded.toChainID,
        recipient: decoded.to,
        amount: decoded.value,
        gas_limit: decoded.gasLimit,
        message: decoded.message,
        params: decoded.zetaParams,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, Bytes, LogData, U256};
    use rstest::rstest;

    fn rpc_log(contract: Address, data: LogData, log_index: u64) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: contract,
                data,
            },
            block_number: Some(100),
            transaction_hash: Some(B256::repeat_byte(0x77)),
            log_index: Some(log_index),
            ..Default::default()
        }
    }

    fn withdrawal_log() -> Log {
        let event = Withdrawal {
            from: address!("0000000000000000000000000000000000000abc"),
            to: Bytes::from(vec![0xab, 0x12, 0xcd]),
            value: U256::from(1_000_000u64),
        };
        rpc_log(Address::repeat_byte(0x20), event.encode_log_data(), 0)
    }

    fn zeta_sent_log() -> Log {
        let event = ZetaSent {
            sender: Address::repeat_byte(0x05),
            toChainID: U256::from(97u64),
            to: Bytes::from(vec![0x01; 20]),
            value: U256::from(42u64),
            gasLimit: U256::from(250_000u64),
            message: Bytes::from_static(b"hello"),
            zetaParams: Bytes::new(),
        };
        rpc_log(Address::repeat_byte(0x30), event.encode_log_data(), 1)
    }

    fn unknown_log() -> Log {
        let data = LogData::new_unchecked(vec![B256::repeat_byte(0xee)], Bytes::new());
        rpc_log(Address::repeat_byte(0x40), data, 2)
    }

    #[test]
    fn test_decode_withdrawal() {
        let event = decode(&withdrawal_log()).unwrap();
        let ChainEvent::AssetWithdrawal(withdrawal) = &event else {
            panic!("expected asset withdrawal, got {event:?}");
        };
        assert_eq!(
            withdrawal.sender,
            address!("0000000000000000000000000000000000000abc")
        );
        assert_eq!(event.recipient().to_vec(), vec![0xab, 0x12, 0xcd]);
        assert_eq!(event.amount(), U256::from(1_000_000u64));
        assert_eq!(event.source_contract(), Address::repeat_byte(0x20));
        assert_eq!(event.source_tx_hash(), B256::repeat_byte(0x77));
        assert_eq!(event.source_block_height(), 100);
    }

    #[test]
    fn test_decode_zeta_sent_reads_indexed_topics() {
        let event = decode(&zeta_sent_log()).unwrap();
        let ChainEvent::NativeTransferOut(transfer) = &event else {
            panic!("expected native transfer-out, got {event:?}");
        };
        assert_eq!(transfer.sender, Address::repeat_byte(0x05));
        assert_eq!(transfer.destination_chain_id, U256::from(97u64));
        assert_eq!(transfer.gas_limit, U256::from(250_000u64));
        assert_eq!(event.message(), Bytes::from_static(b"hello"));
        assert_eq!(event.log_index(), 1);
    }

    #[test]
    fn test_withdrawal_decoder_reports_mismatch_for_zeta_sent() {
        let err = WITHDRAWAL_DECODER.try_decode(&zeta_sent_log()).unwrap_err();
        assert!(err.is_signature_mismatch());
        assert_eq!(
            err,
            DecodeError::SignatureMismatch {
                event: "Withdrawal",
                topic: ZetaSent::SIGNATURE_HASH
            }
        );
    }

    #[test]
    fn test_unrecognized_topic() {
        let err = decode(&unknown_log()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Unrecognized {
                topic: B256::repeat_byte(0xee)
            }
        );
    }

    #[test]
    fn test_missing_topic() {
        let log = rpc_log(Address::ZERO, LogData::new_unchecked(vec![], Bytes::new()), 0);
        assert_eq!(decode(&log).unwrap_err(), DecodeError::MissingTopic);
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let mut log = withdrawal_log();
        let topics = log.inner.data.topics().to_vec();
        log.inner.data = LogData::new_unchecked(topics, Bytes::from(vec![0u8; 7]));

        let err = decode(&log).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedPayload {
                event: "Withdrawal",
                ..
            }
        ));
    }

    #[rstest]
    #[case::transaction_hash("transaction hash")]
    #[case::block_number("block number")]
    #[case::log_index("log index")]
    fn test_pending_log_is_incomplete(#[case] field: &'static str) {
        let mut log = withdrawal_log();
        match field {
            "transaction hash" => log.transaction_hash = None,
            "block number" => log.block_number = None,
            _ => log.log_index = None,
        }
        assert_eq!(decode(&log).unwrap_err(), DecodeError::IncompleteLog { field });
    }

    #[rstest]
    #[case::unknown_first(vec![unknown_log(), withdrawal_log(), zeta_sent_log()], vec![false, true, true])]
    #[case::unknown_middle(vec![withdrawal_log(), unknown_log(), zeta_sent_log()], vec![true, false, true])]
    #[case::unknown_last(vec![zeta_sent_log(), withdrawal_log(), unknown_log()], vec![true, true, false])]
    fn test_batch_survives_unrecognized_log(#[case] logs: Vec<Log>, #[case] expected: Vec<bool>) {
        let results = decode_batch(&logs);
        let decoded: Vec<bool> = results.iter().map(Result::is_ok).collect();
        assert_eq!(decoded, expected);
    }
}
