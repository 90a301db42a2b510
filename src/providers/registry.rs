//! Static asset registry and gas-price table.

use alloy_chains::Chain;
use alloy_primitives::Address;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::protocol::{AssetMetadata, GasPrice};
use crate::traits::{AssetRegistry, GasPriceOracle};

/// Asset registry backed by an in-process table.
///
/// # Examples
///
/// ```rust
/// use cctx_relay::providers::StaticAssetRegistry;
/// use cctx_relay::{AssetMetadata, AssetRegistry, CoinClass};
/// use alloy_chains::Chain;
/// use alloy_primitives::address;
///
/// let usdt = address!("0x00000000000000000000000000000000000000a1");
/// let registry = StaticAssetRegistry::new()
///     .register(AssetMetadata::new(usdt, Chain::from_id(97), CoinClass::Erc20, "USDT"));
/// assert!(registry.enabled_asset(usdt).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticAssetRegistry {
    assets: Arc<RwLock<HashMap<Address, AssetMetadata>>>,
}

impl StaticAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for the asset's contract.
    pub fn register(self, asset: AssetMetadata) -> Self {
        self.insert(asset);
        self
    }

    pub fn insert(&self, asset: AssetMetadata) {
        self.assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(asset.contract_address, asset);
    }

    /// Keeps the entry but stops routing withdrawals for it.
    pub fn disable(&self, contract: Address) {
        if let Some(asset) = self
            .assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&contract)
        {
            asset.enabled = false;
        }
    }
}

impl AssetRegistry for StaticAssetRegistry {
    fn asset(&self, contract: Address) -> Option<AssetMetadata> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&contract)
            .cloned()
    }

    fn enabled_assets(&self) -> Vec<AssetMetadata> {
        self.assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|asset| asset.enabled)
            .cloned()
            .collect()
    }
}

/// Gas-price oracle fed by explicit updates.
#[derive(Debug, Clone, Default)]
pub struct StaticGasOracle {
    prices: Arc<RwLock<HashMap<Chain, GasPrice>>>,
}

impl StaticGasOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a single price for `chain`.
    pub fn with_price(self, chain: Chain, price: u64) -> Self {
        self.set(GasPrice::single(chain, price));
        self
    }

    pub fn set(&self, price: GasPrice) {
        self.prices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(price.chain, price);
    }

    pub fn remove(&self, chain: Chain) {
        self.prices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chain);
    }
}

impl GasPriceOracle for StaticGasOracle {
    fn gas_price(&self, chain: Chain) -> Option<GasPrice> {
        self.prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chain)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CoinClass;
    use alloy_primitives::address;

    const ZRC20: Address = address!("0x00000000000000000000000000000000000000a1");

    #[test]
    fn test_disabled_asset_is_not_enabled() {
        let registry = StaticAssetRegistry::new().register(AssetMetadata::new(
            ZRC20,
            Chain::from_id(97),
            CoinClass::Gas,
            "tBNB",
        ));
        registry.disable(ZRC20);

        assert!(registry.asset(ZRC20).is_some());
        assert!(registry.enabled_asset(ZRC20).is_none());
        assert!(registry.enabled_assets().is_empty());
    }

    #[test]
    fn test_unknown_contract() {
        let registry = StaticAssetRegistry::new();
        assert!(registry.asset(ZRC20).is_none());
    }

    #[test]
    fn test_gas_oracle_median() {
        let chain = Chain::from_id(97);
        let oracle = StaticGasOracle::new();
        oracle.set(GasPrice {
            chain,
            prices: vec![10, 20, 30],
            median_index: 1,
        });

        assert_eq!(oracle.gas_price(chain).and_then(|p| p.median()), Some(20));
        oracle.remove(chain);
        assert!(oracle.gas_price(chain).is_none());
    }
}
