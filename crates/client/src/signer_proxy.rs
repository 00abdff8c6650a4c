//! Transaction signing through a signer-proxy service.
//!
//! The proxy holds the key (typically in an HSM or secure enclave) and answers
//! `eth_signTransaction` JSON-RPC requests with the signed raw transaction.

use crate::ClientError;
use alloy_primitives::{Address, Bytes};
use alloy_rpc_types::eth::TransactionRequest;
use serde::{Deserialize, Serialize};

/// A signer that delegates transaction signing to a signer-proxy service.
///
/// # Example
///
/// ```ignore
/// let proxy = SignerProxy::new("http://localhost:9060", address);
/// let raw = proxy.sign_transaction(filled_tx).await?;
/// provider.send_raw_transaction(&raw).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SignerProxy {
    client: reqwest::Client,
    url: String,
    address: Address,
}

impl SignerProxy {
    /// Creates a new signer proxy client for `address`.
    pub fn new(url: impl Into<String>, address: Address) -> Self {
        Self::with_client(reqwest::Client::new(), url, address)
    }

    /// Creates a new signer proxy client with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, address: Address) -> Self {
        Self {
            client,
            url: url.into(),
            address,
        }
    }

    /// Returns the address the proxy signs for.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the proxy URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Signs a fully filled transaction request.
    ///
    /// Returns the EIP-2718 encoded transaction, ready for
    /// `eth_sendRawTransaction`.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, ClientError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_signTransaction",
            params: [tx],
            id: 1,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ClientError::SignerProxy(format!(
                "signer-proxy returned {status}: {body}"
            )));
        }

        let body: JsonRpcResponse<SignedTransaction> = response.json().await?;
        body.into_raw()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `eth_signTransaction` result.
#[derive(Debug, Deserialize)]
struct SignedTransaction {
    /// The signed transaction as hex-encoded EIP-2718 bytes.
    raw: Bytes,
}

impl JsonRpcResponse<SignedTransaction> {
    fn into_raw(self) -> Result<Bytes, ClientError> {
        match (self.result, self.error) {
            (Some(signed), _) => Ok(signed.raw),
            (None, Some(error)) => Err(ClientError::SignerProxy(format!(
                "JSON-RPC error {}: {}",
                error.code, error.message
            ))),
            (None, None) => Err(ClientError::SignerProxy(
                "empty eth_signTransaction response".to_string(),
            )),
        }
    }
}
