use action::ReceiptOptions;
use alloy_primitives::Address;
use client::{Account, SignerProxy};
use ::config::ChainConfig;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Top-level finalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 RPC endpoint url
    pub rpc_url: String,

    /// L2 RPC endpoint url, only needed to extract withdrawals from receipts
    #[serde(default)]
    pub l2_rpc_url: Option<String>,

    /// Preset chain name (`optimism`, `base-sepolia`, ...)
    #[serde(default)]
    pub chain: Option<String>,

    /// Custom chain descriptor, used instead of `chain`
    #[serde(default)]
    pub chain_file: Option<PathBuf>,

    /// Expected L1 chain id
    #[serde(default)]
    pub l1_chain_id: Option<u64>,

    /// L1 OptimismPortal address, overriding the chain's
    #[serde(default)]
    pub portal_address: Option<Address>,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub receipt: ReceiptConfig,
}

/// Who sends transactions when no private key is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account unlocked on the node
    #[serde(default)]
    pub node: Option<Address>,

    /// Signer proxy endpoint
    #[serde(default)]
    pub signer_proxy_url: Option<String>,

    /// Address whose key the signer proxy holds
    #[serde(default)]
    pub signer_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

const fn default_poll_interval_ms() -> u64 {
    1_000
}

const fn default_max_delay_ms() -> u64 {
    12_000
}

const fn default_max_attempts() -> usize {
    60
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl From<&ReceiptConfig> for ReceiptOptions {
    fn from(config: &ReceiptConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// The L2 the withdrawals belong to, if configured.
    pub fn target_chain(&self) -> eyre::Result<Option<ChainConfig>> {
        if let Some(path) = &self.chain_file {
            return Ok(Some(ChainConfig::from_file(path)?));
        }

        self.chain
            .as_deref()
            .map(ChainConfig::from_name)
            .transpose()
            .map_err(Into::into)
    }

    /// The sending account. A private key takes precedence over the
    /// signer proxy, which takes precedence over a node account.
    pub fn account(&self, private_key: Option<&str>) -> eyre::Result<Account> {
        if let Some(key) = private_key {
            return Ok(Account::from_private_key(key)?);
        }

        if let Some(url) = &self.account.signer_proxy_url {
            let Some(address) = self.account.signer_address else {
                eyre::bail!("account.signer_address is required with account.signer_proxy_url");
            };
            return Ok(Account::Remote(SignerProxy::new(url.clone(), address)));
        }

        if let Some(address) = self.account.node {
            return Ok(Account::Node(address));
        }

        eyre::bail!("No account configured: pass --private-key or set [account] in the config")
    }

    pub fn receipt_options(&self) -> ReceiptOptions {
        ReceiptOptions::from(&self.receipt)
    }
}
