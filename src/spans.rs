//! OpenTelemetry span helpers for relay operations
//!
//! Static span names and structured attributes, kept apart from business logic.
//! The helpers are used internally by the codec, the builder and the watcher, and
//! are public for callers who want to nest their own instrumentation under them.
//!
//! # Example
//!
//! ```rust,no_run
//! use cctx_relay::spans;
//! use alloy_primitives::B256;
//!
//! let inbound_hash = B256::ZERO;
//! let span = spans::await_terminal(&inbound_hash, 5, 3);
//! let _guard = span.enter();
//! // Your custom watch logic here
//! ```

use alloy_chains::Chain;
use alloy_primitives::{Address, B256, U256};
use tracing::Span;

/// Create span for decoding a single source-chain log.
///
/// Parent: batch ingestion span, if any
/// Children: None
#[inline]
pub fn decode_log(contract: &Address, topic: &B256) -> Span {
    tracing::debug_span!(
        "cctx_relay.decode_log",
        contract = %contract,
        topic = %topic,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for building one CCTX from a decoded event.
///
/// Parent: cctx_relay.process_logs or caller span
/// Children: None
#[inline]
pub fn build_cctx(kind: &str, contract: &Address, tx_hash: &B256, amount: &U256) -> Span {
    tracing::info_span!(
        "cctx_relay.build_cctx",
        kind = kind,
        contract = %contract,
        tx_hash = %tx_hash,
        amount = %amount,
        index = tracing::field::Empty,
        destination_chain = tracing::field::Empty,
        nonce = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for ingesting a batch of logs from one transaction.
///
/// Parent: Caller span
/// Children: cctx_relay.decode_log, cctx_relay.build_cctx
#[inline]
pub fn process_logs(target: &Address, origin: &Address, log_count: usize) -> Span {
    tracing::info_span!(
        "cctx_relay.process_logs",
        target = %target,
        origin = %origin,
        log_count = log_count,
    )
}

/// Create span for the whole confirmation wait on one inbound hash.
///
/// Parent: Caller span
/// Children: cctx_relay.resolve_inbound, cctx_relay.poll_cctx (one per CCTX)
#[inline]
pub fn await_terminal(
    inbound_hash: &B256,
    resolve_interval_secs: u64,
    poll_interval_secs: u64,
) -> Span {
    tracing::info_span!(
        "cctx_relay.await_terminal",
        inbound_hash = %inbound_hash,
        resolve_interval_secs = resolve_interval_secs,
        poll_interval_secs = poll_interval_secs,
        cctx_count = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for resolving an inbound hash to its CCTX identities.
///
/// Parent: cctx_relay.await_terminal
/// Children: Ledger query calls
#[inline]
pub fn resolve_inbound(inbound_hash: &B256) -> Span {
    tracing::debug_span!(
        "cctx_relay.resolve_inbound",
        inbound_hash = %inbound_hash,
    )
}

/// Create span for polling one CCTX until it is terminal.
///
/// Parent: cctx_relay.await_terminal
/// Children: Ledger query calls
#[inline]
pub fn poll_cctx(index: &B256) -> Span {
    tracing::debug_span!(
        "cctx_relay.poll_cctx",
        index = %index,
    )
}

/// Record the routing decisions on the current build span.
pub fn record_routing(index: &B256, destination_chain: &Chain, nonce: u64) {
    let current_span = tracing::Span::current();
    current_span.record("index", tracing::field::display(index));
    current_span.record("destination_chain", tracing::field::display(destination_chain));
    current_span.record("nonce", nonce);
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions for error tracking:
/// - error.type: The error type/variant
/// - error.message: Human-readable error message
/// - error.source: The underlying cause, when there is one
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    current_span.record(
        "error.type",
        error.to_string().split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", error.to_string());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
///
/// # Example
///
/// ```rust,no_run
/// use cctx_relay::spans;
///
/// # fn example() {
/// let span = tracing::info_span!("cctx_relay.operation");
/// let _guard = span.enter();
///
/// if let Err(e) = some_operation() {
///     spans::record_error_with_context(
///         "PersistFailed",
///         &format!("Failed to persist CCTX: {}", e),
///         Some("The burnt amount was refunded"),
///     );
/// }
/// # }
/// # fn some_operation() -> Result<(), String> { Ok(()) }
/// ```
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
