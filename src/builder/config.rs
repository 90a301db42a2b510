use alloy_chains::Chain;
use std::env;
use tracing::debug;

use crate::error::ConfigError;

/// Outbound gas limit assigned to every CCTX unless configured otherwise.
pub const DEFAULT_OUTBOUND_GAS_LIMIT: u64 = 90_000;

/// Chain id of the bridge chain the relay observes.
pub const DEFAULT_SOURCE_CHAIN_ID: u64 = 7001;

pub const ENV_SOURCE_CHAIN_ID: &str = "CCTX_SOURCE_CHAIN_ID";
pub const ENV_OUTBOUND_GAS_LIMIT: &str = "CCTX_OUTBOUND_GAS_LIMIT";
pub const ENV_SUPPORTED_DESTINATIONS: &str = "CCTX_SUPPORTED_DESTINATIONS";
pub const ENV_DEFAULT_DESTINATION: &str = "CCTX_DEFAULT_DESTINATION";

/// Routing configuration for CCTX construction.
///
/// # Examples
///
/// ```rust
/// use cctx_relay::RelayConfig;
/// use alloy_chains::Chain;
///
/// let config = RelayConfig::default()
///     .with_supported_destinations([Chain::from_id(97), Chain::from_id(5)])
///     .with_outbound_gas_limit(120_000);
/// assert!(config.is_supported_destination(Chain::from_id(97)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Chain the observed events are emitted on.
    pub source_chain: Chain,
    /// Gas limit written into every outbound transaction.
    pub outbound_gas_limit: u64,
    /// Chains a native transfer-out may name as its destination.
    pub supported_destinations: Vec<Chain>,
    /// Destination used when a native transfer-out names an unsupported chain.
    ///
    /// `None` makes such events fail with
    /// [`BuildError::UnresolvableDestination`](crate::BuildError::UnresolvableDestination).
    pub default_destination: Option<Chain>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            source_chain: Chain::from_id(DEFAULT_SOURCE_CHAIN_ID),
            outbound_gas_limit: DEFAULT_OUTBOUND_GAS_LIMIT,
            supported_destinations: Vec::new(),
            default_destination: None,
        }
    }
}

impl RelayConfig {
    /// Loads the configuration from the environment, reading `.env` first if present.
    ///
    /// Unset variables keep their defaults.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `CCTX_SOURCE_CHAIN_ID` | source chain id |
    /// | `CCTX_OUTBOUND_GAS_LIMIT` | outbound gas limit |
    /// | `CCTX_SUPPORTED_DESTINATIONS` | comma separated chain ids |
    /// | `CCTX_DEFAULT_DESTINATION` | fallback chain id for native transfer-outs |
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), event = "dotenv_loaded");
        }
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_SOURCE_CHAIN_ID) {
            config.source_chain = Chain::from_id(parse_u64(ENV_SOURCE_CHAIN_ID, &value)?);
        }
        if let Some(value) = lookup(ENV_OUTBOUND_GAS_LIMIT) {
            config.outbound_gas_limit = parse_u64(ENV_OUTBOUND_GAS_LIMIT, &value)?;
        }
        if let Some(value) = lookup(ENV_SUPPORTED_DESTINATIONS) {
            config.supported_destinations = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| parse_u64(ENV_SUPPORTED_DESTINATIONS, id).map(Chain::from_id))
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = lookup(ENV_DEFAULT_DESTINATION) {
            config.default_destination =
                Some(Chain::from_id(parse_u64(ENV_DEFAULT_DESTINATION, &value)?));
        }

        Ok(config)
    }

    pub fn with_source_chain(mut self, chain: Chain) -> Self {
        self.source_chain = chain;
        self
    }

    pub fn with_outbound_gas_limit(mut self, gas_limit: u64) -> Self {
        self.outbound_gas_limit = gas_limit;
        self
    }

    pub fn with_supported_destinations(mut self, chains: impl IntoIterator<Item = Chain>) -> Self {
        self.supported_destinations = chains.into_iter().collect();
        self
    }

    /// Sets the fallback destination for native transfer-outs.
    pub fn with_default_destination(mut self, chain: Chain) -> Self {
        self.default_destination = Some(chain);
        self
    }

    pub fn is_supported_destination(&self, chain: Chain) -> bool {
        self.supported_destinations.contains(&chain)
    }
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
    })
}
