//! Errors for contract writes and their classification.
//!
//! Node error messages are not standardized, so classification matches on the
//! phrases geth, reth and anvil all use.

use alloy_json_rpc::{ErrorPayload, RpcError};
use alloy_primitives::{Address, TxHash};
use alloy_rpc_types::TransactionRequest;
use alloy_transport::TransportError;
use client::ClientError;
use std::fmt;
use thiserror::Error;
use withdrawal::WithdrawalError;

const REVERT_PREFIX: &str = "execution reverted";

/// What went wrong when the node executed (or refused) a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// The gas allowance is below what execution needs.
    OutOfGas,
    /// The contract reverted.
    Reverted { reason: Option<String> },
    /// The sender cannot pay for gas and value.
    InsufficientFunds,
    /// The node could not be reached.
    Network,
    /// Any other JSON-RPC error response.
    Rpc { code: i64 },
    /// Malformed response or local usage error.
    Unknown,
}

impl ExecutionErrorKind {
    /// Classify a JSON-RPC failure.
    pub fn classify(error: &TransportError) -> Self {
        match error {
            RpcError::ErrorResp(payload) => Self::from_payload(payload),
            RpcError::Transport(_) => Self::Network,
            _ => Self::Unknown,
        }
    }

    /// Classify a JSON-RPC error response.
    pub fn from_payload(payload: &ErrorPayload) -> Self {
        let message = payload.message.to_lowercase();

        if message.contains("out of gas")
            || message.contains("gas required exceeds")
            || message.contains("intrinsic gas too low")
        {
            return Self::OutOfGas;
        }

        // Revert reasons are contract text and may mention funds
        let revert_data = payload.as_revert_data();
        if message.contains(REVERT_PREFIX) || revert_data.is_some() {
            let reason = revert_data
                .and_then(|data| alloy_sol_types::decode_revert_reason(&data))
                .or_else(|| revert_reason_from_message(&payload.message));
            return Self::Reverted { reason };
        }

        if message.contains("insufficient funds") {
            return Self::InsufficientFunds;
        }

        Self::Rpc { code: payload.code }
    }

    pub const fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::OutOfGas)
    }

    pub const fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }
}

/// `execution reverted: <reason>` → `<reason>`.
fn revert_reason_from_message(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    let start = lower.find(REVERT_PREFIX)? + REVERT_PREFIX.len();
    let reason = message.get(start..)?.trim_start_matches(':').trim();
    (!reason.is_empty()).then(|| reason.to_string())
}

/// The contract call being attempted, for diagnostics.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub address: Address,
    /// Solidity signature, e.g. `finalizeWithdrawalTransaction((uint256,...))`
    pub function: &'static str,
    /// Call arguments rendered as JSON
    pub args: serde_json::Value,
    pub sender: Address,
}

/// A contract call failed while the node simulated it.
///
/// Carries the exact RPC request, the decoded call, and the node's message so
/// the failure can be diagnosed without re-running it.
#[derive(Debug)]
pub struct ContractFunctionExecutionError {
    pub kind: ExecutionErrorKind,
    /// JSON-RPC method that failed
    pub method: &'static str,
    /// Transaction request sent with the method
    pub request: TransactionRequest,
    pub call: ContractCall,
    source: TransportError,
}

impl ContractFunctionExecutionError {
    pub fn new(
        method: &'static str,
        request: TransactionRequest,
        call: ContractCall,
        source: TransportError,
    ) -> Self {
        Self {
            kind: ExecutionErrorKind::classify(&source),
            method,
            request,
            call,
            source,
        }
    }

    /// JSON body of the failed request.
    pub fn request_body(&self) -> String {
        serde_json::json!({
            "method": self.method,
            "params": [&self.request],
        })
        .to_string()
    }

    /// The node's explanation.
    pub fn details(&self) -> String {
        match &self.source {
            RpcError::ErrorResp(payload) => payload.message.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ContractFunctionExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction creation failed.")?;
        writeln!(f)?;
        writeln!(f, "Request body: {}", self.request_body())?;
        writeln!(f)?;
        writeln!(f, "Estimate Gas Arguments:")?;
        if let Some(from) = self.request.from {
            writeln!(f, "  from:  {from}")?;
        }
        writeln!(f, "  to:    {}", self.call.address)?;
        if let Some(data) = self.request.input.input() {
            writeln!(f, "  data:  {data}")?;
        }
        if let Some(gas) = self.request.gas {
            writeln!(f, "  gas:   {gas}")?;
        }
        writeln!(f)?;
        writeln!(f, "Contract Call:")?;
        writeln!(f, "  address:   {}", self.call.address)?;
        writeln!(f, "  function:  {}", self.call.function)?;
        writeln!(f, "  args:      {}", self.call.args)?;
        writeln!(f, "  sender:    {}", self.call.sender)?;
        writeln!(f)?;
        write!(f, "Details: {}", self.details())
    }
}

impl std::error::Error for ContractFunctionExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Error, Debug)]
pub enum ActionError {
    /// Simulation of the contract call failed
    #[error(transparent)]
    Execution(Box<ContractFunctionExecutionError>),

    /// No portal address could be resolved
    #[error("No portal address for {chain} on L1 {l1_chain_id:?}; pass a target chain or portal address")]
    MissingPortal {
        chain: String,
        l1_chain_id: Option<u64>,
    },

    /// The node is on a different chain than requested
    #[error("Chain mismatch: expected chain {expected}, node is on {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// The withdrawal record is inconsistent
    #[error(transparent)]
    InvalidWithdrawal(#[from] WithdrawalError),

    /// Signing or broadcasting failed
    #[error("Failed to submit transaction: {0}")]
    Submit(#[from] ClientError),

    /// Any other RPC failure
    #[error("RPC error: {0}")]
    Rpc(#[from] TransportError),

    /// Receipt polling gave up
    #[error("Transaction {tx_hash} not mined after {attempts} receipt polls")]
    ReceiptTimeout { tx_hash: TxHash, attempts: usize },

    /// Mined, but execution failed
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
}

impl From<ContractFunctionExecutionError> for ActionError {
    fn from(e: ContractFunctionExecutionError) -> Self {
        Self::Execution(Box::new(e))
    }
}

impl ActionError {
    /// Execution classification, when the failure came from the node.
    pub fn kind(&self) -> Option<ExecutionErrorKind> {
        match self {
            Self::Execution(e) => Some(e.kind.clone()),
            Self::Submit(ClientError::Rpc(e)) | Self::Rpc(e) => {
                Some(ExecutionErrorKind::classify(e))
            }
            Self::Reverted(_) => Some(ExecutionErrorKind::Reverted { reason: None }),
            _ => None,
        }
    }
}
