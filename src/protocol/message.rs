//! Canonical CCTX message and its content-derived identity
//!
//! The CCTX index is the keccak256 hash of the ABI-encoded [`CanonicalMessage`].
//! Every field describing the logical transfer goes into the digest. Gas price
//! and nonce are not part of it.
//!
//! # Format
//!
//! ```text
//! (address sender, uint64 senderChainId, address txOrigin, bytes receiver,
//!  uint64 receiverChainId, uint256 amount, bytes message, bytes32 inboundHash,
//!  uint64 inboundBlockHeight, uint64 logIndex, uint64 gasLimit, uint8 coinClass)
//! ```

use alloy_chains::Chain;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolValue};

use super::CoinClass;

sol! {
    /// ABI layout hashed into the CCTX index.
    #[derive(Debug, PartialEq, Eq)]
    struct CanonicalMessage {
        address sender;
        uint64 senderChainId;
        address txOrigin;
        bytes receiver;
        uint64 receiverChainId;
        uint256 amount;
        bytes message;
        bytes32 inboundHash;
        uint64 inboundBlockHeight;
        uint64 logIndex;
        uint64 gasLimit;
        uint8 coinClass;
    }
}

impl CanonicalMessage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sender: Address,
        sender_chain: Chain,
        tx_origin: Address,
        receiver: Bytes,
        receiver_chain: Chain,
        amount: U256,
        message: Bytes,
        inbound_hash: B256,
        inbound_block_height: u64,
        log_index: u64,
        gas_limit: u64,
        coin_class: CoinClass,
    ) -> Self {
        Self {
            sender,
            senderChainId: sender_chain.id(),
            txOrigin: tx_origin,
            receiver,
            receiverChainId: receiver_chain.id(),
            amount,
            message,
            inboundHash: inbound_hash,
            inboundBlockHeight: inbound_block_height,
            logIndex: log_index,
            gasLimit: gas_limit,
            coinClass: coin_class.as_u8(),
        }
    }

    /// Encodes the message in its canonical ABI form.
    pub fn encode(&self) -> Vec<u8> {
        self.abi_encode()
    }

    /// Content-derived CCTX identity.
    pub fn digest(&self) -> B256 {
        keccak256(self.encode())
    }
}
