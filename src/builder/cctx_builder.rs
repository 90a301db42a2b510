use alloy_chains::Chain;
use alloy_primitives::{Address, B256, U256};
use bon::Builder;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

use super::config::RelayConfig;
use crate::error::{BuildError, LedgerError, Result};
use crate::notify::{CctxEvent, CreatedCctx};
use crate::protocol::{AssetMetadata, CanonicalMessage, Cctx, ChainEvent, InboundParams, OutboundParams};
use crate::spans;
use crate::traits::{AssetRegistry, CctxStore, GasPriceOracle, NativePool, NonceAssigner, NotificationSink};

/// Builds CCTX records from decoded source-chain events.
///
/// Each call validates the emitting contract against the asset registry,
/// routes the transfer, prices it, assigns a nonce and stores the record
/// together with its inbound-hash index entry.
///
/// Clones share one set of in-flight identities, so concurrent deliveries of
/// the same event through any clone build at most one record.
///
/// # Example
///
/// ```rust
/// use cctx_relay::providers::{
///     ChainNonces, MemoryLedger, ModulePool, StaticAssetRegistry, StaticGasOracle,
/// };
/// use cctx_relay::{CctxBuilder, RelayConfig, TracingSink};
///
/// let ledger = MemoryLedger::new();
/// let builder = CctxBuilder::builder()
///     .registry(StaticAssetRegistry::new())
///     .gas_oracle(StaticGasOracle::new())
///     .nonces(ChainNonces::new())
///     .pool(ModulePool::default())
///     .store(ledger.clone())
///     .sink(TracingSink)
///     .config(RelayConfig::default())
///     .build();
/// assert_eq!(builder.config().outbound_gas_limit, 90_000);
/// ```
#[derive(Builder, Debug, Clone)]
pub struct CctxBuilder<R, G, N, P, S, E> {
    registry: R,
    gas_oracle: G,
    nonces: N,
    pool: P,
    store: S,
    sink: E,
    #[builder(default)]
    config: RelayConfig,
    #[builder(skip)]
    claims: Claims,
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
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds and stores the CCTX for `event`.
    ///
    /// # Arguments
    ///
    /// * `event` - The decoded source-chain event
    /// * `target` - Contract the originating transaction was sent to
    /// * `origin` - Account that signed the originating transaction
    ///
    /// # Errors
    ///
    /// - [`BuildError::UnknownAsset`] if the emitting contract is not an enabled asset
    /// - [`BuildError::UnresolvableDestination`] if a native transfer-out names an
    ///   unsupported chain and no default destination is configured
    /// - [`BuildError::GasPriceUnavailable`] if no price is published for the destination
    /// - [`BuildError::AlreadyExists`] if the same transfer was already built or
    ///   is being built concurrently
    /// - [`BuildError::BurnFailed`] if the native pool cannot cover a transfer-out
    /// - [`BuildError::PersistFailed`] if the ledger rejects the record
    ///
    /// Nothing is stored, burnt or assigned a nonce when an error is returned,
    /// except that a nonce consumed before [`BuildError::PersistFailed`] is not
    /// given back.
    pub fn build(&self, event: &ChainEvent, target: Address, origin: Address) -> Result<Cctx> {
        self.build_inner(event, target, origin, event.source_tx_hash())
    }

    /// Builds the CCTX for an event emitted while executing another CCTX.
    ///
    /// The record is indexed under `observed_hash` (the parent CCTX index)
    /// instead of the source transaction hash.
    pub fn build_for_inbound(
        &self,
        event: &ChainEvent,
        target: Address,
        origin: Address,
        observed_hash: B256,
    ) -> Result<Cctx> {
        self.build_inner(event, target, origin, observed_hash)
    }

    fn build_inner(
        &self,
        event: &ChainEvent,
        target: Address,
        origin: Address,
        observed_hash: B256,
    ) -> Result<Cctx> {
        let amount = event.amount();
        let span = spans::build_cctx(
            event.kind(),
            &event.source_contract(),
            &event.source_tx_hash(),
            &amount,
        );
        let _guard = span.enter();

        info!(
            recipient = %event.recipient(),
            amount = %amount,
            event = "cctx_build_started"
        );

        let asset = self
            .registry
            .enabled_asset(event.source_contract())
            .ok_or_else(|| {
                fail(BuildError::UnknownAsset {
                    contract: event.source_contract(),
                })
            })?;

        let destination = self.resolve_destination(event, &asset).map_err(fail)?;

        let gas_price = self
            .gas_oracle
            .gas_price(destination)
            .and_then(|price| price.median())
            .ok_or_else(|| fail(BuildError::GasPriceUnavailable { chain: destination }))?;

        let index = CanonicalMessage::new(
            target,
            self.config.source_chain,
            origin,
            event.recipient().clone(),
            destination,
            amount,
            event.message(),
            observed_hash,
            event.source_block_height(),
            event.log_index(),
            self.config.outbound_gas_limit,
            asset.coin_class,
        )
        .digest();

        let _claim = self
            .claims
            .claim(index)
            .filter(|_| !self.store.contains(&index))
            .ok_or_else(|| fail(BuildError::AlreadyExists { index }))?;

        let burnt = match event {
            ChainEvent::NativeTransferOut(_) => {
                self.pool
                    .burn(amount)
                    .map_err(|source| fail(BuildError::BurnFailed { amount, source }))?;
                true
            }
            ChainEvent::AssetWithdrawal(_) => false,
        };

        let nonce = self.nonces.next_nonce(destination);

        let cctx = Cctx::new_pending(
            index,
            asset.coin_class,
            amount,
            event.message(),
            InboundParams {
                sender: target,
                source_chain: self.config.source_chain,
                tx_origin: origin,
                observed_hash,
                observed_block_height: event.source_block_height(),
                log_index: event.log_index(),
            },
            OutboundParams {
                recipient: event.recipient().clone(),
                destination_chain: destination,
                gas_limit: self.config.outbound_gas_limit,
                gas_price,
                nonce,
            },
        );

        if let Err(source) = self.store.insert_with_index(&cctx) {
            if burnt {
                self.refund(amount);
            }
            if let LedgerError::DuplicateIndex { .. } = source {
                // another writer stored this record outside of our claims
                error!(
                    index = %index,
                    nonce = nonce,
                    destination_chain = %destination,
                    event = "cctx_duplicate_on_insert"
                );
                return Err(fail(BuildError::AlreadyExists { index }));
            }
            spans::record_error_with_context(
                "PersistFailed",
                &source.to_string(),
                Some(&format!("nonce {nonce} on {destination} was consumed")),
            );
            let err = BuildError::PersistFailed { index, source };
            warn!(error = %err, event = "cctx_build_failed");
            return Err(err);
        }

        spans::record_routing(&index, &destination, nonce);
        info!(
            index = %index,
            destination_chain = %destination,
            gas_price = gas_price,
            nonce = nonce,
            event = "cctx_created"
        );

        let created = CreatedCctx::from(&cctx);
        self.sink.emit(match event {
            ChainEvent::AssetWithdrawal(_) => CctxEvent::WithdrawalCreated(created),
            ChainEvent::NativeTransferOut(_) => CctxEvent::NativeTransferCreated(created),
        });

        Ok(cctx)
    }

    fn resolve_destination(&self, event: &ChainEvent, asset: &AssetMetadata) -> Result<Chain> {
        let transfer = match event {
            ChainEvent::AssetWithdrawal(_) => return Ok(asset.destination_chain),
            ChainEvent::NativeTransferOut(transfer) => transfer,
        };

        let requested = u64::try_from(transfer.destination_chain_id)
            .ok()
            .map(Chain::from_id)
            .filter(|chain| self.config.is_supported_destination(*chain));
        if let Some(chain) = requested {
            return Ok(chain);
        }

        match self.config.default_destination {
            Some(fallback) => {
                warn!(
                    requested_chain_id = %transfer.destination_chain_id,
                    fallback_chain = %fallback,
                    event = "default_destination_applied"
                );
                Ok(fallback)
            }
            None => Err(BuildError::UnresolvableDestination {
                chain_id: transfer.destination_chain_id,
            }),
        }
    }

    fn refund(&self, amount: U256) {
        if let Err(e) = self.pool.refund(amount) {
            error!(
                amount = %amount,
                error = %e,
                event = "native_pool_refund_failed"
            );
        }
    }
}

/// Identities currently being built.
#[derive(Debug, Clone, Default)]
struct Claims {
    in_flight: Arc<Mutex<HashSet<B256>>>,
}

impl Claims {
    /// Returns `None` if `index` is already claimed.
    fn claim(&self, index: B256) -> Option<Claim<'_>> {
        self.lock().insert(index).then_some(Claim {
            claims: self,
            index,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<B256>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases its identity on drop.
struct Claim<'a> {
    claims: &'a Claims,
    index: B256,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.claims.lock().remove(&self.index);
    }
}

fn fail(err: BuildError) -> BuildError {
    spans::record_error(&err);
    warn!(error = %err, event = "cctx_build_failed");
    err
}
