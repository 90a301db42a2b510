//! Relay notifications
//!
//! The builder announces every CCTX it stores. Consumers (monitoring, UIs) read
//! these signals but never answer back into the relay.

use alloy_chains::Chain;
use alloy_primitives::{B256, U256};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::protocol::{Cctx, CoinClass};
use crate::traits::NotificationSink;

/// Summary of a freshly created CCTX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedCctx {
    pub index: B256,
    pub inbound_hash: B256,
    pub destination_chain: Chain,
    pub recipient: String,
    pub amount: U256,
    pub coin_class: CoinClass,
    pub nonce: u64,
}

impl From<&Cctx> for CreatedCctx {
    fn from(cctx: &Cctx) -> Self {
        Self {
            index: cctx.index(),
            inbound_hash: cctx.inbound().observed_hash,
            destination_chain: cctx.outbound().destination_chain,
            recipient: cctx.outbound().recipient_address(),
            amount: cctx.burnt_amount(),
            coin_class: cctx.coin_class(),
            nonce: cctx.outbound().nonce,
        }
    }
}

/// Notification emitted on CCTX creation, one kind per source event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CctxEvent {
    WithdrawalCreated(CreatedCctx),
    NativeTransferCreated(CreatedCctx),
}

impl CctxEvent {
    pub fn cctx(&self) -> &CreatedCctx {
        match self {
            Self::WithdrawalCreated(c) | Self::NativeTransferCreated(c) => c,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WithdrawalCreated(_) => "withdrawal_created",
            Self::NativeTransferCreated(_) => "native_transfer_created",
        }
    }
}

/// Writes notifications to the `tracing` pipeline as JSON payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn emit(&self, event: CctxEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        info!(
            index = %event.cctx().index,
            payload = %payload,
            event = event.name()
        );
    }
}

/// Forwards notifications into an unbounded channel.
///
/// A dropped receiver is not an error for the relay; the notification is
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<CctxEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CctxEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn emit(&self, event: CctxEvent) {
        if let Err(e) = self.sender.send(event) {
            debug!(index = %e.0.cctx().index, event = "notification_dropped");
        }
    }
}
