//! Typed bridge events decoded from source-chain logs

use alloy_primitives::{Address, Bytes, TxHash, U256};

/// Where a decoded event was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOrigin {
    /// Contract that emitted the log
    pub contract: Address,
    pub tx_hash: TxHash,
    pub block_height: u64,
    pub log_index: u64,
}

/// A bridged asset being withdrawn to its home chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetWithdrawal {
    pub origin: LogOrigin,
    pub sender: Address,
    pub recipient: Bytes,
    pub amount: U256,
}

/// The bridge chain's native coin sent out to another chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTransferOut {
    pub origin: LogOrigin,
    pub sender: Address,
    /// Chain id as emitted by the connector, not yet validated
    pub destination_chain_id: U256,
    pub recipient: Bytes,
    pub amount: U256,
    pub gas_limit: U256,
    pub message: Bytes,
    pub params: Bytes,
}

/// Closed set of events the relay understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    AssetWithdrawal(AssetWithdrawal),
    NativeTransferOut(NativeTransferOut),
}

impl ChainEvent {
    /// Name used in logs and spans.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetWithdrawal(_) => "asset_withdrawal",
            Self::NativeTransferOut(_) => "native_transfer_out",
        }
    }

    pub fn origin(&self) -> &LogOrigin {
        match self {
            Self::AssetWithdrawal(e) => &e.origin,
            Self::NativeTransferOut(e) => &e.origin,
        }
    }

    pub fn source_contract(&self) -> Address {
        self.origin().contract
    }

    pub fn source_tx_hash(&self) -> TxHash {
        self.origin().tx_hash
    }

    pub fn source_block_height(&self) -> u64 {
        self.origin().block_height
    }

    pub fn log_index(&self) -> u64 {
        self.origin().log_index
    }

    pub fn recipient(&self) -> &Bytes {
        match self {
            Self::AssetWithdrawal(e) => &e.recipient,
            Self::NativeTransferOut(e) => &e.recipient,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            Self::AssetWithdrawal(e) => e.amount,
            Self::NativeTransferOut(e) => e.amount,
        }
    }

    /// Memo relayed to the destination; withdrawals carry none.
    pub fn message(&self) -> Bytes {
        match self {
            Self::AssetWithdrawal(_) => Bytes::new(),
            Self::NativeTransferOut(e) => e.message.clone(),
        }
    }
}
