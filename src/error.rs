use alloy_chains::Chain;
use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::protocol::Status;

/// Failure to turn a raw log into a [`ChainEvent`](crate::ChainEvent).
///
/// Every variant is recoverable: the caller moves on to the next decoder or the
/// next log in the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Event signature mismatch for {event}: topic {topic}")]
    SignatureMismatch { event: &'static str, topic: B256 },

    #[error("Malformed {event} payload: {reason}")]
    MalformedPayload { event: &'static str, reason: String },

    #[error("Log carries no topics")]
    MissingTopic,

    #[error("Unrecognized event signature: {topic}")]
    Unrecognized { topic: B256 },

    #[error("Log is missing {field}")]
    IncompleteLog { field: &'static str },
}

impl DecodeError {
    /// Returns true if the log simply belongs to another event type.
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch { .. })
    }
}

/// Failure to construct a CCTX from a decoded event.
///
/// Construction errors only ever concern the single event being built.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("No enabled asset registered for contract {contract}")]
    UnknownAsset { contract: Address },

    #[error("Cannot resolve destination chain id {chain_id}")]
    UnresolvableDestination { chain_id: U256 },

    #[error("Gas price not found for {chain}")]
    GasPriceUnavailable { chain: Chain },

    #[error("CCTX {index} already exists")]
    AlreadyExists { index: B256 },

    #[error("Failed to burn {amount} from the native pool: {source}")]
    BurnFailed {
        amount: U256,
        #[source]
        source: PoolError,
    },

    #[error("Failed to persist CCTX {index}: {source}")]
    PersistFailed {
        index: B256,
        #[source]
        source: LedgerError,
    },
}

impl BuildError {
    /// Returns true if the same event may succeed once missing data shows up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UnknownAsset { .. }
                | Self::UnresolvableDestination { .. }
                | Self::GasPriceUnavailable { .. }
        )
    }
}

/// Outcome of the confirmation-wait protocol other than success.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Logged on every failed query; never returned by the watcher.
    #[error("Transient query failure: {0}")]
    TransientQueryFailure(#[from] QueryError),

    #[error("Watch cancelled")]
    Cancelled,

    #[error("Deadline exceeded with {} CCTX still pending", pending.len())]
    DeadlineExceeded {
        pending: Vec<B256>,
        completed: Vec<crate::Cctx>,
    },

    #[error("Giving up on {key} after {attempts} consecutive query failures: {last_error}")]
    QueryFailuresExhausted {
        key: B256,
        attempts: u32,
        last_error: QueryError,
    },

    /// A poller task panicked; the remaining pollers are stopped.
    #[error("CCTX poller failed with {} CCTX still pending: {reason}", pending.len())]
    PollerFailed { pending: Vec<B256>, reason: String },
}

/// Ledger read-side failures.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Not found: {key}")]
    NotFound { key: B256 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },
}

/// Ledger write-side failures.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("CCTX {index} already stored")]
    DuplicateIndex { index: B256 },

    #[error("CCTX {index} not found")]
    NotFound { index: B256 },

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Status {current:?} is terminal and cannot move to {requested:?}")]
    TerminalOverwrite { current: Status, requested: Status },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Insufficient pool balance: have {balance}, need {requested}")]
    InsufficientBalance { balance: U256, requested: U256 },

    #[error("Pool unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
