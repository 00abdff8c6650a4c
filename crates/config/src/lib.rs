//! Chain configuration for OP Stack withdrawal actions.
//!
//! This crate provides:
//! - Target chain descriptors with per-L1 portal addresses
//! - Presets for known OP Stack chains (mainnet, testnet)
//! - Loading custom chain descriptors from TOML

pub mod chain;

pub use chain::{ChainConfig, ChainConfigBuilder, ConfigError, PortalDeployment};
