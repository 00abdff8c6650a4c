pub mod error;
pub mod finalize;
pub mod receipt;
pub mod write;

pub use error::{ActionError, ContractFunctionExecutionError, ExecutionErrorKind};
pub use finalize::{
    estimate_finalize_withdrawal_gas, finalize_withdrawal, FinalizeAction, FinalizeWithdrawal,
};
pub use receipt::{wait_for_receipt, ConfirmedTransaction, ReceiptOptions, ReceiptStatus};
pub use write::{estimate_contract_gas, write_contract, ContractWrite};

use std::future::Future;

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all preconditions are met.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if the action was already executed successfully.
    fn is_completed(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action and wait for its receipt.
    fn execute(&mut self) -> impl Future<Output = eyre::Result<ConfirmedTransaction>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}
