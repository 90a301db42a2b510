use alloy_chains::Chain;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Classification of a bridged coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CoinClass {
    /// The bridge chain's own coin, burnt from the module pool on transfer-out
    Native = 0,
    /// Gas coin of a foreign chain
    Gas = 1,
    /// ERC20-like token of a foreign chain
    Erc20 = 2,
}

impl CoinClass {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Registry entry for a bridged asset contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub contract_address: Address,
    pub destination_chain: Chain,
    pub coin_class: CoinClass,
    pub enabled: bool,
    pub symbol: String,
}

impl AssetMetadata {
    pub fn new(
        contract_address: Address,
        destination_chain: Chain,
        coin_class: CoinClass,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            contract_address,
            destination_chain,
            coin_class,
            enabled: true,
            symbol: symbol.into(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Gas prices published for a chain by its observers.
///
/// The outbound price is the entry at `median_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    pub chain: Chain,
    pub prices: Vec<u64>,
    pub median_index: usize,
}

impl GasPrice {
    /// A price list with a single observation.
    pub fn single(chain: Chain, price: u64) -> Self {
        Self {
            chain,
            prices: vec![price],
            median_index: 0,
        }
    }

    /// Returns `None` when the median index points outside the price list.
    pub fn median(&self) -> Option<u64> {
        self.prices.get(self.median_index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_price_median() {
        let price = GasPrice {
            chain: Chain::from_id(97),
            prices: vec![10, 20, 30],
            median_index: 1,
        };
        assert_eq!(price.median(), Some(20));
    }

    #[test]
    fn test_gas_price_median_out_of_range() {
        let price = GasPrice {
            chain: Chain::from_id(97),
            prices: vec![],
            median_index: 0,
        };
        assert_eq!(price.median(), None);
    }

    #[test]
    fn test_asset_metadata_disabled() {
        let asset = AssetMetadata::new(
            Address::ZERO,
            Chain::from_id(5),
            CoinClass::Gas,
            "gETH",
        );
        assert!(asset.enabled);
        assert!(!asset.disabled().enabled);
    }
}
