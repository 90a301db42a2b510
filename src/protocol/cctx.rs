//! Cross-chain transaction record
//!
//! A [`Cctx`] is the unit of bridge work: one value transfer observed on the
//! source chain and routed to a destination chain. Its identity is fixed at
//! construction and its status only ever moves forward.

use alloy_chains::Chain;
use alloy_primitives::{hex, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::CoinClass;
use crate::error::StatusError;

/// Lifecycle status of a CCTX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    PendingOutbound,
    OutboundMined,
    Aborted,
    Reverted,
}

impl Status {
    /// Returns true if no further transition may happen from this status.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OutboundMined | Self::Aborted | Self::Reverted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PendingOutbound => "PendingOutbound",
            Self::OutboundMined => "OutboundMined",
            Self::Aborted => "Aborted",
            Self::Reverted => "Reverted",
        };
        f.write_str(name)
    }
}

/// Status plus the human-readable message reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CctxStatus {
    pub status: Status,
    pub message: String,
}

impl CctxStatus {
    pub fn pending_outbound() -> Self {
        Self {
            status: Status::PendingOutbound,
            message: "pending outbound".to_string(),
        }
    }

    /// Moves to `next`, refusing to leave a terminal status.
    ///
    /// A pending record may be refreshed with a new message or finalized into
    /// any terminal status.
    pub fn transition(&mut self, next: Status, message: impl Into<String>) -> Result<(), StatusError> {
        if self.status.is_terminal() {
            return Err(StatusError::TerminalOverwrite {
                current: self.status,
                requested: next,
            });
        }
        self.status = next;
        self.message = message.into();
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Where the transfer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundParams {
    /// Contract the originating transaction was sent to
    pub sender: Address,
    pub source_chain: Chain,
    /// Externally owned account that signed the originating transaction
    pub tx_origin: Address,
    /// Hash the CCTX is indexed under: the source transaction or a parent CCTX
    pub observed_hash: B256,
    pub observed_block_height: u64,
    pub log_index: u64,
}

/// Where the transfer goes and how the outbound transaction is paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundParams {
    /// Raw recipient bytes; EVM recipients are 20 bytes but other chains differ
    pub recipient: Bytes,
    pub destination_chain: Chain,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub nonce: u64,
}

impl OutboundParams {
    /// Recipient rendered as a `0x`-prefixed hex string.
    pub fn recipient_address(&self) -> String {
        hex::encode_prefixed(&self.recipient)
    }
}

/// Cross-chain transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cctx {
    index: B256,
    coin_class: CoinClass,
    burnt_amount: U256,
    mint_amount: U256,
    relayed_message: Bytes,
    status: CctxStatus,
    inbound: InboundParams,
    outbound: OutboundParams,
}

impl Cctx {
    /// Creates a pending record. Minted and burnt amounts start out equal.
    pub(crate) fn new_pending(
        index: B256,
        coin_class: CoinClass,
        amount: U256,
        relayed_message: Bytes,
        inbound: InboundParams,
        outbound: OutboundParams,
    ) -> Self {
        Self {
            index,
            coin_class,
            burnt_amount: amount,
            mint_amount: amount,
            relayed_message,
            status: CctxStatus::pending_outbound(),
            inbound,
            outbound,
        }
    }

    pub fn index(&self) -> B256 {
        self.index
    }

    pub fn coin_class(&self) -> CoinClass {
        self.coin_class
    }

    pub fn burnt_amount(&self) -> U256 {
        self.burnt_amount
    }

    pub fn mint_amount(&self) -> U256 {
        self.mint_amount
    }

    pub fn relayed_message(&self) -> &Bytes {
        &self.relayed_message
    }

    pub fn status(&self) -> &CctxStatus {
        &self.status
    }

    pub fn inbound(&self) -> &InboundParams {
        &self.inbound
    }

    pub fn outbound(&self) -> &OutboundParams {
        &self.outbound
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a status update reported by the outbound-execution side.
    pub fn transition(&mut self, next: Status, message: impl Into<String>) -> Result<(), StatusError> {
        self.status.transition(next, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Cctx {
        Cctx::new_pending(
            B256::repeat_byte(0x11),
            CoinClass::Erc20,
            U256::from(1_000_000u64),
            Bytes::new(),
            InboundParams {
                sender: Address::repeat_byte(0x01),
                source_chain: Chain::from_id(7001),
                tx_origin: Address::repeat_byte(0x02),
                observed_hash: B256::repeat_byte(0x03),
                observed_block_height: 42,
                log_index: 0,
            },
            OutboundParams {
                recipient: Bytes::from(vec![0xab, 0xcd]),
                destination_chain: Chain::from_id(97),
                gas_limit: 90_000,
                gas_price: 10,
                nonce: 0,
            },
        )
    }

    #[test]
    fn test_new_pending_conserves_amount() {
        let cctx = sample();
        assert_eq!(cctx.mint_amount(), cctx.burnt_amount());
        assert_eq!(cctx.status().status, Status::PendingOutbound);
        assert!(!cctx.is_terminal());
    }

    #[rstest]
    #[case(Status::OutboundMined)]
    #[case(Status::Aborted)]
    #[case(Status::Reverted)]
    fn test_terminal_status_is_never_overwritten(#[case] terminal: Status) {
        let mut cctx = sample();
        cctx.transition(terminal, "done").unwrap();
        assert!(cctx.is_terminal());

        for next in [
            Status::PendingOutbound,
            Status::OutboundMined,
            Status::Aborted,
            Status::Reverted,
        ] {
            let err = cctx.transition(next, "again").unwrap_err();
            assert_eq!(
                err,
                StatusError::TerminalOverwrite {
                    current: terminal,
                    requested: next
                }
            );
        }
        assert_eq!(cctx.status().status, terminal);
        assert_eq!(cctx.status().message, "done");
    }

    #[test]
    fn test_pending_status_message_can_be_refreshed() {
        let mut cctx = sample();
        cctx.transition(Status::PendingOutbound, "outbound broadcast")
            .unwrap();
        assert_eq!(cctx.status().message, "outbound broadcast");
        assert!(!cctx.is_terminal());
    }

    #[test]
    fn test_recipient_address_is_hex_prefixed() {
        assert_eq!(sample().outbound().recipient_address(), "0xabcd");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::OutboundMined.to_string(), "OutboundMined");
    }
}
