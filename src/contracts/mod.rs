//! Source-chain contract bindings
//!
//! Alloy-generated bindings for the events the relay ingests:
//!
//! - [`ZRC20::Withdrawal`](zrc20::ZRC20::Withdrawal): a bridged asset withdrawn to its home chain
//! - [`ZetaConnector::ZetaSent`](connector::ZetaConnector::ZetaSent): native coin sent out

pub mod connector;
pub mod zrc20;
