use crate::hash::compute_withdrawal_hash;
use alloy_primitives::{Address, Bytes, B256, U256};
use binding::opstack::WithdrawalTransaction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type WithdrawalHash = B256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalStatus {
    Initiated,
    Proven { timestamp: u64 },
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenWithdrawal {
    pub dispute_game_proxy: Address,
    pub timestamp: u64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WithdrawalError {
    /// The record's hash does not commit to its fields
    #[error("Withdrawal hash mismatch: record has {expected}, fields hash to {computed}")]
    HashMismatch {
        expected: WithdrawalHash,
        computed: WithdrawalHash,
    },
}

/// A withdrawal initiated on L2, as emitted by `MessagePassed`.
///
/// Serialized with camelCase keys so records exported by other tooling can be
/// loaded directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    /// Message passer nonce (version in the top 2 bytes)
    pub nonce: U256,
    pub sender: Address,
    pub target: Address,
    /// Value in wei
    pub value: U256,
    pub gas_limit: U256,
    pub data: Bytes,
    pub withdrawal_hash: WithdrawalHash,
}

impl Withdrawal {
    /// Build a record from the withdrawal tuple, computing its hash.
    pub fn new(tx: WithdrawalTransaction) -> Self {
        let withdrawal_hash = compute_withdrawal_hash(&tx);
        Self {
            nonce: tx.nonce,
            sender: tx.sender,
            target: tx.target,
            value: tx.value,
            gas_limit: tx.gasLimit,
            data: tx.data,
            withdrawal_hash,
        }
    }

    /// The tuple passed to the portal.
    pub fn transaction(&self) -> WithdrawalTransaction {
        WithdrawalTransaction {
            nonce: self.nonce,
            sender: self.sender,
            target: self.target,
            value: self.value,
            gasLimit: self.gas_limit,
            data: self.data.clone(),
        }
    }

    /// Check that `withdrawal_hash` commits to the other fields.
    pub fn verify(&self) -> Result<(), WithdrawalError> {
        let computed = compute_withdrawal_hash(&self.transaction());
        if computed != self.withdrawal_hash {
            return Err(WithdrawalError::HashMismatch {
                expected: self.withdrawal_hash,
                computed,
            });
        }
        Ok(())
    }
}

impl From<WithdrawalTransaction> for Withdrawal {
    fn from(tx: WithdrawalTransaction) -> Self {
        Self::new(tx)
    }
}
