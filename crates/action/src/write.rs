//! Contract write pipeline: simulate, pick gas, sign, broadcast.
//!
//! Every write is simulated with `eth_estimateGas` before it is signed. A
//! caller-supplied gas limit becomes the simulation's allowance, so a limit
//! that is too low fails here with a classified error instead of producing an
//! out-of-gas transaction on chain.

use crate::error::{ActionError, ContractCall, ContractFunctionExecutionError};
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use client::{with_gas_buffer, Account};
use tracing::{debug, info};

/// A state-changing call to a contract.
#[derive(Debug, Clone)]
pub struct ContractWrite<C> {
    /// Contract address
    pub address: Address,
    /// ABI call
    pub call: C,
    /// Arguments as JSON, for error reports
    pub args: serde_json::Value,
    /// Gas limit; estimated when `None`
    pub gas: Option<u64>,
    /// Expected chain ID; checked against the node when set
    pub chain_id: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub nonce: Option<u64>,
}

impl<C: SolCall> ContractWrite<C> {
    pub const fn new(address: Address, call: C) -> Self {
        Self {
            address,
            call,
            args: serde_json::Value::Null,
            gas: None,
            chain_id: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            nonce: None,
        }
    }

    pub fn args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    pub const fn gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }

    pub const fn chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// The transaction request for this call, sent from `from`.
    pub fn transaction_request(&self, from: Address) -> TransactionRequest {
        TransactionRequest {
            from: Some(from),
            to: Some(self.address.into()),
            input: TransactionInput::new(self.call.abi_encode().into()),
            gas: self.gas,
            chain_id: self.chain_id,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            nonce: self.nonce,
            ..Default::default()
        }
    }

    fn contract_call(&self, sender: Address) -> ContractCall {
        ContractCall {
            address: self.address,
            function: C::SIGNATURE,
            args: self.args.clone(),
            sender,
        }
    }
}

/// Check the node is on the expected chain, if one is given.
pub(crate) async fn assert_chain_id<P: Provider>(
    provider: &P,
    expected: Option<u64>,
) -> Result<(), ActionError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = provider.get_chain_id().await?;
    if actual != expected {
        return Err(ActionError::ChainMismatch { expected, actual });
    }
    Ok(())
}

/// Simulate a write and return the node's gas estimate.
pub async fn estimate_contract_gas<P, C>(
    provider: &P,
    from: Address,
    write: &ContractWrite<C>,
) -> Result<u64, ActionError>
where
    P: Provider,
    C: SolCall,
{
    let request = write.transaction_request(from);

    debug!(
        to = %write.address,
        function = C::SIGNATURE,
        gas_allowance = ?write.gas,
        "Estimating gas"
    );

    match provider.estimate_gas(request.clone()).await {
        Ok(gas) => Ok(gas),
        Err(e) => Err(ContractFunctionExecutionError::new(
            "eth_estimateGas",
            request,
            write.contract_call(from),
            e,
        )
        .into()),
    }
}

/// Gas limit to sign with: the caller's when given, else the buffered estimate.
const fn gas_limit(supplied: Option<u64>, estimate: u64) -> u64 {
    match supplied {
        Some(gas) => gas,
        None => with_gas_buffer(estimate),
    }
}

/// Submit a contract write and return its hash without waiting for inclusion.
pub async fn write_contract<P, C>(
    provider: &P,
    account: &Account,
    write: ContractWrite<C>,
) -> Result<TxHash, ActionError>
where
    P: Provider,
    C: SolCall,
{
    let from = account.address();
    assert_chain_id(provider, write.chain_id).await?;

    let estimate = estimate_contract_gas(provider, from, &write).await?;
    let gas = gas_limit(write.gas, estimate);

    let mut tx = write.transaction_request(from);
    tx.gas = Some(gas);

    let tx_hash = account.send_transaction(provider, tx).await?;

    info!(
        %tx_hash,
        to = %write.address,
        function = C::SIGNATURE,
        gas,
        estimate,
        "Transaction submitted"
    );

    Ok(tx_hash)
}
