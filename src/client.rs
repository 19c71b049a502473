//! KleverClient - main entry point for the SDK

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::abi::decode::decode_return;
use crate::abi::encode::encode_arg;
use crate::abi::value::{DecodedValue, EncodedArg, Value};
use crate::abi::{AbiDocument, Endpoint, EndpointMutability};
use crate::call::{build_call_data, build_query_args};
use crate::config::NetworkConfig;
use crate::constants::QUERY_RETURN_OK;
use crate::error::{Error, Result};
use crate::monitor::{
    MonitorConfig, TransactionFetcher, TransactionMonitor, TransactionOutcome, TransactionRecord,
};
use crate::wallet::{TransactionEnvelope, WalletProvider};

// ========== Node Request/Response Types ==========

/// Transaction detail as returned by `GET /transaction/{hash}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result_code: Option<String>,
    #[serde(default)]
    pub logs: Option<TransactionLog>,
    #[serde(default)]
    pub receipts: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub contract: Option<serde_json::Value>,
}

/// Log block attached to a confirmed transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionLog {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub events: Vec<LogEvent>,
}

/// One contract event emitted during execution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: Option<Vec<String>>,
}

impl LogEvent {
    /// Event topics converted from their base64 transport form to hex, ready
    /// for the return decoder.
    pub fn topics_hex(&self) -> Result<Vec<String>> {
        self.topics.iter().map(|t| transport_to_hex(t)).collect()
    }
}

/// Read-only query request for `POST /sc/query`.
#[derive(Debug, Clone, Serialize)]
pub struct ScQuery {
    #[serde(rename = "ScAddress")]
    pub sc_address: String,
    #[serde(rename = "FuncName")]
    pub func_name: String,
    #[serde(rename = "Arguments")]
    pub arguments: Vec<String>,
}

/// Response of a read-only query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "returnData", default)]
    pub return_data: Vec<String>,
    #[serde(rename = "returnCode", default)]
    pub return_code: Option<String>,
    #[serde(rename = "returnMessage", default)]
    pub return_message: Option<String>,
}

impl QueryResponse {
    /// Whether the contract answered the query successfully.
    pub fn is_success(&self) -> bool {
        self.return_code
            .as_deref()
            .map_or(true, |code| code == QUERY_RETURN_OK)
    }

    /// Return slots converted from their base64 transport form to hex.
    pub fn return_data_hex(&self) -> Result<Vec<String>> {
        self.return_data
            .iter()
            .map(|slot| transport_to_hex(slot))
            .collect()
    }
}

/// Account snapshot from `GET /address/{address}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub nonce: u64,
}

fn transport_to_hex(slot: &str) -> Result<String> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    let bytes = BASE64
        .decode(slot)
        .map_err(|e| Error::decode("returnData", format!("invalid base64 slot: {e}")))?;
    Ok(hex::encode(bytes))
}

// ========== Client ==========

/// Main client for interacting with contracts on a Klever node
pub struct KleverClient<W: WalletProvider> {
    wallet: W,
    config: NetworkConfig,
    http: reqwest::Client,
}

impl<W: WalletProvider> KleverClient<W> {
    /// Create a new KleverClient
    pub fn new(wallet: W, config: NetworkConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            wallet,
            config,
            http,
        })
    }

    /// Get the wallet's signer address
    pub fn address(&self) -> &str {
        self.wallet.address()
    }

    /// Get the network configuration
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    // ========== Node REST Operations ==========

    /// Fetch a transaction status snapshot by hash.
    pub async fn get_transaction(&self, hash: &str) -> Result<TransactionDetail> {
        let url = format!("{}/transaction/{}", self.config.node_url, hash);
        self.get_json(&url).await
    }

    /// Fetch the full transaction detail, including logs.
    pub async fn get_transaction_with_results(&self, hash: &str) -> Result<TransactionDetail> {
        let url = format!(
            "{}/transaction/{}?withResults=true",
            self.config.node_url, hash
        );
        self.get_json(&url).await
    }

    /// Execute a raw read-only contract query.
    ///
    /// Network failures surface immediately; one-shot queries are never
    /// retried by the SDK.
    pub async fn query(&self, query: ScQuery) -> Result<QueryResponse> {
        let url = format!("{}/sc/query", self.config.node_url);
        debug!(func = %query.func_name, "submitting contract query");
        let response = self.http.post(&url).json(&query).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch account balance and nonce for an address.
    pub async fn get_account(&self, address: &str) -> Result<AccountInfo> {
        let url = format!("{}/address/{}", self.config.node_url, address);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "node request");
        let response = self.http.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    // ========== Contract Operations ==========

    /// Invoke a state-changing endpoint.
    ///
    /// Looks up the endpoint in the ABI, checks mutability and arity, encodes
    /// each argument against its declared input type, assembles the call-data
    /// payload, and hands the envelope to the wallet for signing and
    /// broadcast.
    ///
    /// # Returns
    ///
    /// A pending [`TransactionRecord`] carrying the broadcast hash.
    pub async fn invoke(
        &self,
        abi: &AbiDocument,
        contract: &str,
        endpoint_name: &str,
        args: &[Value],
    ) -> Result<TransactionRecord> {
        let endpoint = lookup_endpoint(abi, endpoint_name)?;
        if endpoint.mutability != EndpointMutability::Mutable {
            return Err(Error::Abi(format!(
                "endpoint '{endpoint_name}' is readonly; use query_endpoint instead"
            )));
        }
        let encoded = encode_inputs(endpoint, args)?;
        let payload = build_call_data(endpoint_name, &encoded);

        let envelope = TransactionEnvelope::new(self.wallet.address(), contract, payload);
        let hash = self.wallet.sign_and_broadcast(envelope).await?;
        Ok(TransactionRecord::new(hash))
    }

    /// Execute a readonly endpoint as a synchronous query and decode its
    /// return value.
    ///
    /// Returns `Ok(None)` when the endpoint declares no outputs.
    pub async fn query_endpoint(
        &self,
        abi: &AbiDocument,
        contract: &str,
        endpoint_name: &str,
        args: &[Value],
    ) -> Result<Option<DecodedValue>> {
        let endpoint = lookup_endpoint(abi, endpoint_name)?;
        if endpoint.mutability != EndpointMutability::Readonly {
            return Err(Error::Abi(format!(
                "endpoint '{endpoint_name}' is state-changing; use invoke instead"
            )));
        }
        let encoded = encode_inputs(endpoint, args)?;

        let response = self
            .query(ScQuery {
                sc_address: contract.to_string(),
                func_name: endpoint_name.to_string(),
                arguments: build_query_args(&encoded),
            })
            .await?;
        if !response.is_success() {
            return Err(Error::Abi(format!(
                "query to '{endpoint_name}' failed: {}{}",
                response.return_code.as_deref().unwrap_or("unknown code"),
                response
                    .return_message
                    .as_deref()
                    .map(|m| format!(" ({m})"))
                    .unwrap_or_default(),
            )));
        }

        let slots = response.return_data_hex()?;
        let hex_value = slots.first().cloned().unwrap_or_default();
        decode_return(abi, &hex_value, endpoint_name)
    }

    // ========== Monitoring ==========

    /// Poll the node for a broadcast transaction, advancing the record's
    /// status to the terminal outcome.
    pub async fn wait_for(
        &self,
        record: &mut TransactionRecord,
        config: MonitorConfig,
    ) -> Result<TransactionOutcome> {
        let monitor = TransactionMonitor::new(self, config);
        let outcome = monitor.wait(&record.hash).await?;
        record.advance(outcome.status);
        Ok(outcome)
    }

    /// Build a monitor that can watch transactions in background tasks.
    pub fn monitor(self: Arc<Self>, config: MonitorConfig) -> TransactionMonitor<Arc<Self>>
    where
        W: 'static,
    {
        TransactionMonitor::new(self, config)
    }
}

impl<W: WalletProvider> TransactionFetcher for KleverClient<W> {
    fn transaction(
        &self,
        hash: &str,
    ) -> impl std::future::Future<Output = Result<TransactionDetail>> + Send {
        self.get_transaction(hash)
    }

    fn transaction_with_results(
        &self,
        hash: &str,
    ) -> impl std::future::Future<Output = Result<TransactionDetail>> + Send {
        self.get_transaction_with_results(hash)
    }
}

fn lookup_endpoint<'a>(abi: &'a AbiDocument, endpoint_name: &str) -> Result<&'a Endpoint> {
    abi.endpoint(endpoint_name)
        .ok_or_else(|| Error::Abi(format!("endpoint '{endpoint_name}' not found in ABI")))
}

/// Encode call arguments against the endpoint's declared inputs, in order.
fn encode_inputs(endpoint: &Endpoint, args: &[Value]) -> Result<Vec<EncodedArg>> {
    if endpoint.inputs.len() != args.len() {
        return Err(Error::Abi(format!(
            "endpoint '{}' expects {} arguments, got {}",
            endpoint.name,
            endpoint.inputs.len(),
            args.len()
        )));
    }
    endpoint
        .inputs
        .iter()
        .zip(args)
        .map(|(input, value)| encode_arg(value, &input.type_name))
        .collect()
}
