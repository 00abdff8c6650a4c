mod signer_proxy;

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, TxHash};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
pub use signer_proxy::SignerProxy;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// JSON-RPC or transport failure talking to the node
    #[error(transparent)]
    Rpc(#[from] TransportError),

    /// Error building or signing the transaction locally
    #[error("Signing failed: {0}")]
    Signer(String),

    /// Error returned by the signer proxy
    #[error("Signer proxy error: {0}")]
    SignerProxy(String),

    /// HTTP error talking to the signer proxy
    #[error("Signer proxy request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience function to create an ethereum rpc provider from url.
pub async fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Gas limit with a 20% safety buffer on top of a node estimate.
pub const fn with_gas_buffer(estimate: u64) -> u64 {
    estimate.saturating_add(estimate / 5)
}

/// The account that sends a transaction.
#[derive(Debug, Clone)]
pub enum Account {
    /// Account unlocked on the node (dev accounts, clef, ...).
    ///
    /// Submitted with `eth_sendTransaction`; the node fills and signs.
    Node(Address),
    /// Local private key. Filled and signed here, sent raw.
    Local(PrivateKeySigner),
    /// Key held by a signer proxy. Filled here, signed remotely, sent raw.
    Remote(SignerProxy),
}

impl Account {
    /// Create a local account from a hex private key (with or without 0x prefix).
    pub fn from_private_key(private_key: &str) -> Result<Self, ClientError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))?;
        Ok(Self::Local(signer))
    }

    /// Address transactions are sent from.
    pub fn address(&self) -> Address {
        match self {
            Self::Node(address) => *address,
            Self::Local(signer) => signer.address(),
            Self::Remote(proxy) => proxy.address(),
        }
    }

    /// Sign (where applicable) and broadcast a transaction.
    ///
    /// Returns as soon as the node accepts it; inclusion is not awaited.
    pub async fn send_transaction<P>(
        &self,
        provider: &P,
        mut tx: TransactionRequest,
    ) -> Result<TxHash, ClientError>
    where
        P: Provider,
    {
        let from = self.address();
        tx.from = Some(from);

        match self {
            Self::Node(_) => {
                debug!(%from, "Submitting via eth_sendTransaction");
                let hash: TxHash = provider
                    .raw_request("eth_sendTransaction".into(), (tx,))
                    .await?;
                Ok(hash)
            }
            Self::Local(signer) => {
                let filled_tx = fill_transaction(tx, provider, from).await?;
                let wallet = EthereumWallet::from(signer.clone());

                // Build and sign the typed transaction
                let envelope: TxEnvelope = filled_tx
                    .build(&wallet)
                    .await
                    .map_err(|e| ClientError::Signer(e.to_string()))?;

                // Encode to EIP-2718 bytes
                let mut encoded = Vec::new();
                envelope.encode_2718(&mut encoded);

                let pending = provider.send_raw_transaction(&encoded).await?;
                Ok(*pending.tx_hash())
            }
            Self::Remote(proxy) => {
                let filled_tx = fill_transaction(tx, provider, from).await?;
                let raw = proxy.sign_transaction(filled_tx).await?;

                let pending = provider.send_raw_transaction(&raw).await?;
                Ok(*pending.tx_hash())
            }
        }
    }
}

/// Fill missing transaction fields using the provider.
///
/// Fields already set by the caller are left untouched, so a request with
/// everything set causes no RPC traffic.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
) -> Result<TransactionRequest, ClientError>
where
    P: Provider,
{
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(provider.get_chain_id().await?);
    }

    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Fees before gas: estimation may need them
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        tx.gas = Some(with_gas_buffer(gas_estimate));
    }

    Ok(tx)
}
