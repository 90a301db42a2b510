//! REST query client for a remote CCTX ledger.

use alloy_primitives::B256;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::error::QueryError;
use crate::protocol::Cctx;
use crate::traits::CctxQueryClient;

/// Ledger query path for a single CCTX
pub const CCTX_PATH: &str = "zeta-chain/crosschain/cctx/";

/// Ledger query path for the inbound-hash index
pub const INBOUND_HASH_PATH: &str = "zeta-chain/crosschain/inTxHashToCctx/";

#[derive(Debug, Deserialize)]
struct CctxResponse {
    #[serde(rename = "CrossChainTx")]
    cross_chain_tx: Cctx,
}

#[derive(Debug, Deserialize)]
struct InboundHashResponse {
    #[serde(rename = "inTxHashToCctx")]
    in_tx_hash_to_cctx: InboundHashEntry,
}

#[derive(Debug, Deserialize)]
struct InboundHashEntry {
    #[serde(rename = "cctx_index", default)]
    cctx_index: Vec<B256>,
}

/// Query client for a ledger node's REST gateway.
///
/// # Examples
///
/// ```rust,no_run
/// use cctx_relay::providers::RestCctxQueryClient;
/// use cctx_relay::CctxQueryClient;
/// use alloy_primitives::B256;
///
/// # async fn example() -> Result<(), cctx_relay::QueryError> {
/// let client = RestCctxQueryClient::new("http://localhost:1317")?;
/// let indexes = client.inbound_hash_to_cctx(B256::ZERO).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestCctxQueryClient {
    base_url: Url,
    client: Client,
}

impl RestCctxQueryClient {
    /// Creates a client for the gateway at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, QueryError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self, QueryError> {
        let mut base_url = Url::parse(base_url).map_err(|e| QueryError::InvalidUrl {
            reason: format!("{base_url}: {e}"),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, client })
    }

    fn cctx_url(&self, index: B256) -> Result<Url, QueryError> {
        self.join(&format!("{CCTX_PATH}{index}"))
    }

    fn inbound_hash_url(&self, inbound_hash: B256) -> Result<Url, QueryError> {
        self.join(&format!("{INBOUND_HASH_PATH}{inbound_hash}"))
    }

    fn join(&self, path: &str) -> Result<Url, QueryError> {
        self.base_url
            .join(path)
            .map_err(|e| QueryError::InvalidUrl {
                reason: format!("{path}: {e}"),
            })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url, key: B256) -> Result<T, QueryError> {
        trace!(url = %url, "Requesting ledger record");
        let response = self.client.get(url).send().await?;

        let status_code = response.status();
        trace!(status_code = %status_code, "Received ledger response");

        if status_code == StatusCode::NOT_FOUND {
            debug!(key = %key, event = "ledger_record_not_found");
            return Err(QueryError::NotFound { key });
        }
        if status_code.is_server_error() {
            return Err(QueryError::Unavailable(format!(
                "ledger gateway returned {status_code}"
            )));
        }
        response.error_for_status_ref()?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CctxQueryClient for RestCctxQueryClient {
    #[instrument(skip(self), fields(index = %index))]
    async fn cctx(&self, index: B256) -> Result<Cctx, QueryError> {
        let url = self.cctx_url(index)?;
        let response: CctxResponse = self.get(url, index).await?;
        Ok(response.cross_chain_tx)
    }

    #[instrument(skip(self), fields(inbound_hash = %inbound_hash))]
    async fn inbound_hash_to_cctx(&self, inbound_hash: B256) -> Result<Vec<B256>, QueryError> {
        let url = self.inbound_hash_url(inbound_hash)?;
        let response: InboundHashResponse = self.get(url, inbound_hash).await?;
        Ok(response.in_tx_hash_to_cctx.cctx_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cctx_url() {
        let client = RestCctxQueryClient::new("http://localhost:1317").unwrap();
        let url = client.cctx_url(B256::repeat_byte(0x11)).unwrap();
        insta::assert_snapshot!(url, @"http://localhost:1317/zeta-chain/crosschain/cctx/0x1111111111111111111111111111111111111111111111111111111111111111");
    }

    #[test]
    fn test_inbound_hash_url_keeps_base_path() {
        let client = RestCctxQueryClient::new("https://api.example.com/gateway").unwrap();
        let url = client.inbound_hash_url(B256::ZERO).unwrap();
        insta::assert_snapshot!(url, @"https://api.example.com/gateway/zeta-chain/crosschain/inTxHashToCctx/0x0000000000000000000000000000000000000000000000000000000000000000");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RestCctxQueryClient::new("not a url"),
            Err(QueryError::InvalidUrl { .. })
        ));
    }

    fn mined_cctx() -> Cctx {
        use crate::protocol::{CoinClass, InboundParams, OutboundParams, Status};
        use alloy_chains::Chain;
        use alloy_primitives::{Address, Bytes, U256};

        let mut cctx = Cctx::new_pending(
            B256::repeat_byte(0x0c),
            CoinClass::Gas,
            U256::from(1_000_000u64),
            Bytes::new(),
            InboundParams {
                sender: Address::repeat_byte(0xd1),
                source_chain: Chain::from_id(7001),
                tx_origin: Address::repeat_byte(0xe1),
                observed_hash: B256::repeat_byte(0x77),
                observed_block_height: 4_321,
                log_index: 0,
            },
            OutboundParams {
                recipient: Bytes::from(vec![0xab; 20]),
                destination_chain: Chain::from_id(97),
                gas_limit: 90_000,
                gas_price: 10_000_000_000,
                nonce: 7,
            },
        );
        cctx.transition(Status::OutboundMined, "outbound mined").unwrap();
        cctx
    }

    #[test]
    fn test_parse_cctx_response() {
        let cctx = mined_cctx();
        let json = serde_json::json!({ "CrossChainTx": cctx }).to_string();

        let response: CctxResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(response.cross_chain_tx, cctx);
        assert!(response.cross_chain_tx.is_terminal());
        assert_eq!(response.cross_chain_tx.outbound().nonce, 7);
    }

    #[test]
    fn test_cctx_response_requires_envelope() {
        let json = serde_json::to_string(&mined_cctx()).unwrap();
        assert!(serde_json::from_str::<CctxResponse>(&json).is_err());
    }

    #[test]
    fn test_parse_inbound_hash_response() {
        let json = r#"{
            "inTxHashToCctx": {
                "inTxHash": "0x00",
                "cctx_index": [
                    "0x0101010101010101010101010101010101010101010101010101010101010101",
                    "0x0202020202020202020202020202020202020202020202020202020202020202"
                ]
            }
        }"#;
        let response: InboundHashResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.in_tx_hash_to_cctx.cctx_index,
            vec![B256::repeat_byte(1), B256::repeat_byte(2)]
        );
    }
}
