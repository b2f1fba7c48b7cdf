//! BlockCypher data provider.
//!
//! Reads address and transaction data from the BlockCypher REST API and
//! normalizes satoshi amounts to BTC.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use explorer_core::constants::{
    DEFAULT_BLOCKCYPHER_BASE_URL, DEFAULT_UPSTREAM_TIMEOUT_SECS, PROVIDER_BLOCKCYPHER,
};
use explorer_core::error::{ExplorerError, Result};
use explorer_core::traits::DataProvider;
use explorer_core::types::{satoshis_to_btc, AddressInfo, TransactionEndpoint, TransactionInfo};

/// BlockCypher client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockCypherConfig {
    /// API root, e.g. "https://api.blockcypher.com/v1/btc/main"
    pub base_url: String,
    /// Optional API token for higher rate limits
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for BlockCypherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BLOCKCYPHER_BASE_URL.into(),
            token: None,
            timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

impl BlockCypherConfig {
    /// Creates a config pointing at a different API root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Data provider backed by the BlockCypher API.
pub struct BlockCypherProvider {
    config: BlockCypherConfig,
    base_url: String,
    http_client: reqwest::Client,
}

impl BlockCypherProvider {
    /// Creates a provider for Bitcoin mainnet with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(BlockCypherConfig::default())
    }

    /// Creates a provider with custom configuration.
    ///
    /// Fails if the base URL does not parse or the HTTP client cannot be built.
    pub fn with_config(config: BlockCypherConfig) -> Result<Self> {
        let parsed = url::Url::parse(&config.base_url).map_err(|e| {
            ExplorerError::ConfigError(format!("Invalid BlockCypher URL '{}': {}", config.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExplorerError::ConfigError(format!(
                "Unsupported BlockCypher URL scheme: {}",
                parsed.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ExplorerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
            http_client,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &BlockCypherConfig {
        &self.config
    }

    /// Issues a GET and returns the body of a successful response.
    ///
    /// Non-success statuses yield `Ok(None)`.
    async fn fetch(&self, path: &str) -> Result<Option<String>> {
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self
            .http_client
            .get(&url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.config.token {
            request = request.query(&[("token", token)]);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(path, %status, "Upstream returned non-success status");
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        Ok(Some(body))
    }

    fn transport_error(&self, err: reqwest::Error) -> ExplorerError {
        if err.is_timeout() {
            ExplorerError::UpstreamTimeout {
                seconds: self.config.timeout_seconds,
            }
        } else {
            ExplorerError::HttpError(err.to_string())
        }
    }
}

#[async_trait]
impl DataProvider for BlockCypherProvider {
    fn name(&self) -> &str {
        PROVIDER_BLOCKCYPHER
    }

    #[instrument(skip(self))]
    async fn get_address_info(&self, address: &str) -> Result<Option<AddressInfo>> {
        let body = match self.fetch(&format!("addrs/{}", address)).await? {
            Some(body) => body,
            None => return Ok(None),
        };

        let data: AddressResponse = serde_json::from_str(&body)
            .map_err(|e| ExplorerError::UpstreamSchema(format!("address response: {}", e)))?;

        // A 200 without the fields we need is reported as "not found"
        match (data.address, data.balance, data.n_tx) {
            (Some(address), Some(balance), Some(n_tx)) => {
                Ok(Some(AddressInfo::from_satoshis(address, balance, n_tx)))
            }
            _ => {
                error!(address, body = %body, "Invalid response data");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_transaction_info(&self, hash: &str) -> Result<Option<TransactionInfo>> {
        let body = match self.fetch(&format!("txs/{}", hash)).await? {
            Some(body) => body,
            None => return Ok(None),
        };

        let data: TransactionResponse = serde_json::from_str(&body)
            .map_err(|e| ExplorerError::UpstreamSchema(format!("transaction response: {}", e)))?;

        data.into_transaction_info().map(Some)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM RESPONSE SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

/// `GET /addrs/{address}`. Every field is optional so that an incomplete
/// response can be told apart from an undecodable one.
#[derive(Debug, Deserialize)]
struct AddressResponse {
    address: Option<String>,
    balance: Option<u64>,
    n_tx: Option<u64>,
}

/// `GET /txs/{hash}`. Fields are required; a response without them is an error.
#[derive(Debug, Deserialize)]
struct TransactionResponse {
    hash: String,
    fees: u64,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
    block_height: i64,
    received: String,
}

#[derive(Debug, Deserialize)]
struct TransactionInput {
    addresses: Vec<String>,
    output_value: u64,
}

#[derive(Debug, Deserialize)]
struct TransactionOutput {
    addresses: Vec<String>,
    value: u64,
}

impl TransactionResponse {
    /// Keeps only the first address of every leg.
    fn into_transaction_info(self) -> Result<TransactionInfo> {
        let inputs = self
            .inputs
            .into_iter()
            .enumerate()
            .map(|(i, leg)| primary_endpoint(leg.addresses, leg.output_value, "input", i))
            .collect::<Result<Vec<_>>>()?;

        let outputs = self
            .outputs
            .into_iter()
            .enumerate()
            .map(|(i, leg)| primary_endpoint(leg.addresses, leg.value, "output", i))
            .collect::<Result<Vec<_>>>()?;

        Ok(TransactionInfo {
            hash: self.hash,
            fee: satoshis_to_btc(self.fees),
            inputs,
            outputs,
            transaction_index: self.block_height,
            block_time: self.received,
        })
    }
}

fn primary_endpoint(
    addresses: Vec<String>,
    satoshis: u64,
    side: &str,
    index: usize,
) -> Result<TransactionEndpoint> {
    let address = addresses.into_iter().next().ok_or_else(|| {
        ExplorerError::UpstreamSchema(format!("{} {} has no addresses", side, index))
    })?;
    Ok(TransactionEndpoint::new(address, satoshis_to_btc(satoshis)))
}
