//! Target chain descriptors.
//!
//! An OP Stack chain settles on an L1 where its `OptimismPortal` lives. A chain
//! may have portals on more than one L1 (e.g. a mainnet deployment plus a
//! devnet fork), so each deployment records its L1 chain id.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const ETHEREUM_MAINNET: u64 = 1;
const ETHEREUM_SEPOLIA: u64 = 11_155_111;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Chain name not in the preset table
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    /// Error reading a config file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a config file
    #[error("Invalid chain config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// An `OptimismPortal` deployment on a specific L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalDeployment {
    /// L1 chain ID the portal is deployed on
    pub chain_id: u64,
    /// Portal contract address
    pub address: Address,
}

/// An OP Stack L2 and the portal contracts that finalize its withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// L2 chain ID
    pub id: u64,
    /// Human-readable name
    pub name: String,
    /// Chain ID of the settlement layer (L1)
    pub source_id: u64,
    /// OptimismPortal deployments, one per L1
    pub portals: Vec<PortalDeployment>,
    /// Block time in seconds
    #[serde(default = "default_block_time")]
    pub block_time_secs: u64,
}

const fn default_block_time() -> u64 {
    2
}

impl ChainConfig {
    fn preset(id: u64, name: &str, source_id: u64, portal: Address, block_time_secs: u64) -> Self {
        Self {
            id,
            name: name.to_string(),
            source_id,
            portals: vec![PortalDeployment {
                chain_id: source_id,
                address: portal,
            }],
            block_time_secs,
        }
    }

    /// OP Mainnet.
    pub fn optimism() -> Self {
        // https://etherscan.io/address/0xbEb5Fc579115071764c7423A4f12eDde41f106Ed
        Self::preset(
            10,
            "optimism",
            ETHEREUM_MAINNET,
            address!("0xbEb5Fc579115071764c7423A4f12eDde41f106Ed"),
            2,
        )
    }

    /// OP Sepolia.
    pub fn optimism_sepolia() -> Self {
        Self::preset(
            11_155_420,
            "optimism-sepolia",
            ETHEREUM_SEPOLIA,
            address!("0x16Fc5058F25648194471939df75CF27A2e143319"),
            2,
        )
    }

    /// Base mainnet.
    pub fn base() -> Self {
        Self::preset(
            8453,
            "base",
            ETHEREUM_MAINNET,
            address!("0x49048044D57e1C92A77f79988d21Fa8fAF74E97e"),
            2,
        )
    }

    /// Base Sepolia.
    pub fn base_sepolia() -> Self {
        Self::preset(
            84_532,
            "base-sepolia",
            ETHEREUM_SEPOLIA,
            address!("0x49f53e41452C74589E85cA1677426Ba426459e85"),
            2,
        )
    }

    /// Unichain mainnet.
    pub fn unichain() -> Self {
        Self::preset(
            130,
            "unichain",
            ETHEREUM_MAINNET,
            address!("0x0bd48f6B86a26D3a217d0Fa6FfE2B491B956A7a2"),
            1,
        )
    }

    /// Unichain Sepolia.
    pub fn unichain_sepolia() -> Self {
        Self::preset(
            1301,
            "unichain-sepolia",
            ETHEREUM_SEPOLIA,
            address!("0x0d83dab629f0e0F9d36c0Cbc89B69a489f0751bD"),
            1,
        )
    }

    /// All built-in presets.
    pub fn presets() -> Vec<Self> {
        vec![
            Self::optimism(),
            Self::optimism_sepolia(),
            Self::base(),
            Self::base_sepolia(),
            Self::unichain(),
            Self::unichain_sepolia(),
        ]
    }

    /// Look up a preset by name (case-insensitive, `_` and `-` interchangeable).
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let wanted = name.to_ascii_lowercase().replace('_', "-");
        Self::presets()
            .into_iter()
            .find(|chain| chain.name == wanted)
            .ok_or_else(|| ConfigError::UnknownChain(name.to_string()))
    }

    /// Load a custom chain descriptor from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Resolve the portal address for a withdrawal.
    ///
    /// With an L1 chain id the lookup is exact. Without one, the portal on the
    /// settlement chain is used, then the first configured portal.
    pub fn portal(&self, l1_chain_id: Option<u64>) -> Option<Address> {
        let on = |id: u64| {
            self.portals
                .iter()
                .find(|portal| portal.chain_id == id)
                .map(|portal| portal.address)
        };

        match l1_chain_id {
            Some(id) => on(id),
            None => on(self.source_id).or_else(|| self.portals.first().map(|p| p.address)),
        }
    }
}

/// Builder for custom chain descriptors (devnets, forks).
#[derive(Debug, Clone)]
pub struct ChainConfigBuilder {
    chain: ChainConfig,
}

impl ChainConfigBuilder {
    /// Start from an existing descriptor.
    pub const fn from_chain(chain: ChainConfig) -> Self {
        Self { chain }
    }

    /// Start from an empty descriptor.
    pub fn new(id: u64, name: impl Into<String>, source_id: u64) -> Self {
        Self {
            chain: ChainConfig {
                id,
                name: name.into(),
                source_id,
                portals: Vec::new(),
                block_time_secs: default_block_time(),
            },
        }
    }

    /// Set the portal address on an L1, replacing any existing deployment there.
    pub fn portal(mut self, l1_chain_id: u64, address: Address) -> Self {
        self.chain
            .portals
            .retain(|portal| portal.chain_id != l1_chain_id);
        self.chain.portals.push(PortalDeployment {
            chain_id: l1_chain_id,
            address,
        });
        self
    }

    /// Override the block time.
    pub const fn block_time_secs(mut self, secs: u64) -> Self {
        self.chain.block_time_secs = secs;
        self
    }

    /// Build the chain descriptor.
    pub fn build(self) -> ChainConfig {
        self.chain
    }
}
