//! Relay protocol types
//!
//! This module contains the records the relay produces and consumes: decoded
//! chain events, asset metadata, the CCTX record and its canonical message.

mod asset;
mod cctx;
mod event;
mod message;

pub use asset::{AssetMetadata, CoinClass, GasPrice};
pub use cctx::{Cctx, CctxStatus, InboundParams, OutboundParams, Status};
pub use event::{AssetWithdrawal, ChainEvent, LogOrigin, NativeTransferOut};
pub use message::CanonicalMessage;
