//! Finalize withdrawal action.
//!
//! Finalizes a proven withdrawal on L1 by calling
//! `finalizeWithdrawalTransaction` on the chain's `OptimismPortal`, which
//! releases the withdrawn ETH and executes the withdrawal's call on L1.

use crate::{
    error::ActionError,
    receipt::{wait_for_receipt, ConfirmedTransaction, ReceiptOptions},
    write::{assert_chain_id, estimate_contract_gas, write_contract, ContractWrite},
    Action,
};
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use binding::opstack::IOptimismPortal2::finalizeWithdrawalTransactionCall;
use client::Account;
use config::ChainConfig;
use tracing::info;
use withdrawal::{state::WithdrawalStateProvider, Withdrawal, WithdrawalHash};

/// Parameters for finalizing a withdrawal on L1.
#[derive(Debug, Clone)]
pub struct FinalizeWithdrawal {
    /// Account that signs and pays for the transaction
    pub account: Account,
    /// L2 the withdrawal was initiated on
    pub target_chain: Option<ChainConfig>,
    pub withdrawal: Withdrawal,
    /// Gas limit; estimated when `None`
    pub gas: Option<u64>,
    /// L1 chain ID; asserted against the node and used to pick the portal
    pub chain: Option<u64>,
    /// Portal address, overriding the one configured for `target_chain`
    pub portal_address: Option<Address>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub nonce: Option<u64>,
}

impl FinalizeWithdrawal {
    pub const fn new(account: Account, withdrawal: Withdrawal) -> Self {
        Self {
            account,
            target_chain: None,
            withdrawal,
            gas: None,
            chain: None,
            portal_address: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            nonce: None,
        }
    }

    pub fn target_chain(mut self, chain: ChainConfig) -> Self {
        self.target_chain = Some(chain);
        self
    }

    pub const fn gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }

    pub const fn chain(mut self, chain: Option<u64>) -> Self {
        self.chain = chain;
        self
    }

    pub const fn portal_address(mut self, portal_address: Option<Address>) -> Self {
        self.portal_address = portal_address;
        self
    }

    pub const fn fees(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub const fn nonce(mut self, nonce: Option<u64>) -> Self {
        self.nonce = nonce;
        self
    }

    /// The portal the withdrawal is finalized on.
    ///
    /// An explicit address wins over the target chain's deployment on `chain`.
    pub fn resolve_portal(&self) -> Result<Address, ActionError> {
        if let Some(portal) = self.portal_address {
            return Ok(portal);
        }

        self.target_chain
            .as_ref()
            .and_then(|target| target.portal(self.chain))
            .ok_or_else(|| ActionError::MissingPortal {
                chain: self
                    .target_chain
                    .as_ref()
                    .map_or_else(|| "unspecified chain".to_string(), |c| c.name.clone()),
                l1_chain_id: self.chain,
            })
    }

    /// The portal call, after checking the withdrawal's hash.
    pub fn contract_write(
        &self,
    ) -> Result<ContractWrite<finalizeWithdrawalTransactionCall>, ActionError> {
        self.withdrawal.verify()?;
        let portal = self.resolve_portal()?;

        let call = finalizeWithdrawalTransactionCall {
            _tx: self.withdrawal.transaction(),
        };
        let args = serde_json::json!([{
            "nonce": self.withdrawal.nonce.to_string(),
            "sender": self.withdrawal.sender,
            "target": self.withdrawal.target,
            "value": self.withdrawal.value.to_string(),
            "gasLimit": self.withdrawal.gas_limit.to_string(),
            "data": self.withdrawal.data,
            "withdrawalHash": self.withdrawal.withdrawal_hash,
        }]);

        Ok(ContractWrite {
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            nonce: self.nonce,
            ..ContractWrite::new(portal, call)
                .args(args)
                .gas(self.gas)
                .chain_id(self.chain)
        })
    }
}

/// Submit `finalizeWithdrawalTransaction` and return the transaction hash.
///
/// Does not wait for inclusion; see [`wait_for_receipt`].
pub async fn finalize_withdrawal<P>(
    provider: &P,
    params: &FinalizeWithdrawal,
) -> Result<TxHash, ActionError>
where
    P: Provider,
{
    let write = params.contract_write()?;

    info!(
        withdrawal_hash = %params.withdrawal.withdrawal_hash,
        portal = %write.address,
        from = %params.account.address(),
        gas = ?params.gas,
        "Finalizing withdrawal"
    );

    write_contract(provider, &params.account, write).await
}

/// Gas the node estimates for finalizing the withdrawal.
pub async fn estimate_finalize_withdrawal_gas<P>(
    provider: &P,
    params: &FinalizeWithdrawal,
) -> Result<u64, ActionError>
where
    P: Provider,
{
    let write = params.contract_write()?;
    assert_chain_id(provider, write.chain_id).await?;
    estimate_contract_gas(provider, params.account.address(), &write).await
}

/// Action to finalize a proven withdrawal on L1.
pub struct FinalizeAction<P> {
    l1_provider: P,
    state: WithdrawalStateProvider<P>,
    params: FinalizeWithdrawal,
    receipt_options: ReceiptOptions,
}

impl<P> FinalizeAction<P>
where
    P: Provider + Clone,
{
    /// Fails when no portal can be resolved for the withdrawal.
    pub fn new(l1_provider: P, params: FinalizeWithdrawal) -> Result<Self, ActionError> {
        let portal = params.resolve_portal()?;
        Ok(Self {
            state: WithdrawalStateProvider::new(l1_provider.clone(), portal),
            l1_provider,
            params,
            receipt_options: ReceiptOptions::default(),
        })
    }

    pub const fn with_receipt_options(mut self, options: ReceiptOptions) -> Self {
        self.receipt_options = options;
        self
    }

    /// Get the withdrawal hash for this action.
    pub const fn withdrawal_hash(&self) -> WithdrawalHash {
        self.params.withdrawal.withdrawal_hash
    }

    /// `finalizeWithdrawalTransaction` uses the caller's own proof.
    fn proof_submitter(&self) -> Address {
        self.params.account.address()
    }
}

impl<P> Action for FinalizeAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.state.is_finalized(self.withdrawal_hash()).await? {
            return Ok(false);
        }

        let remaining = self
            .state
            .seconds_until_finalizable(self.withdrawal_hash(), self.proof_submitter())
            .await?;

        Ok(remaining == Some(0))
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        self.state.is_finalized(self.withdrawal_hash()).await
    }

    async fn execute(&mut self) -> eyre::Result<ConfirmedTransaction> {
        if self.is_completed().await? {
            eyre::bail!("Withdrawal already finalized")
        }

        match self
            .state
            .seconds_until_finalizable(self.withdrawal_hash(), self.proof_submitter())
            .await?
        {
            None => eyre::bail!("Withdrawal not proven yet"),
            Some(0) => {}
            Some(remaining) => eyre::bail!(
                "Proof maturity delay not elapsed. {} seconds remaining",
                remaining
            ),
        }

        let tx_hash = finalize_withdrawal(&self.l1_provider, &self.params).await?;
        let confirmed = wait_for_receipt(&self.l1_provider, tx_hash, self.receipt_options).await?;

        if !confirmed.is_success() {
            return Err(ActionError::Reverted(tx_hash).into());
        }

        info!(
            %tx_hash,
            block_number = ?confirmed.block_number,
            gas_used = confirmed.gas_used,
            withdrawal_hash = %self.withdrawal_hash(),
            "Withdrawal finalized on L1"
        );

        Ok(confirmed)
    }

    fn description(&self) -> String {
        format!("Finalizing withdrawal {} on L1", self.withdrawal_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ExecutionErrorKind,
        test_utils::{mocked_provider, op_mainnet_withdrawal, ANVIL_ACCOUNT},
    };
    use alloy_json_rpc::ErrorPayload;
    use alloy_primitives::{address, b256, hex, Bytes, U256};
    use alloy_sol_types::{SolCall, SolValue};

    const OP_PORTAL: Address = address!("bEb5Fc579115071764c7423A4f12eDde41f106Ed");
    const TX_HASH: TxHash =
        b256!("5555555555555555555555555555555555555555555555555555555555555555");

    fn params() -> FinalizeWithdrawal {
        FinalizeWithdrawal::new(Account::Node(ANVIL_ACCOUNT), op_mainnet_withdrawal())
            .target_chain(ChainConfig::optimism())
    }

    fn returns(value: impl SolValue) -> Bytes {
        Bytes::from(value.abi_encode())
    }

    #[test]
    fn test_calldata_matches_portal_abi() {
        let write = params().contract_write().unwrap();

        assert_eq!(write.address, OP_PORTAL);
        assert_eq!(
            hex::encode_prefixed(write.call.abi_encode()),
            include_str!("../../withdrawal/testdata/op_mainnet_finalize_calldata.hex").trim()
        );
    }

    #[test]
    fn test_error_args_use_decimal_values() {
        let withdrawal = op_mainnet_withdrawal();
        let write = params().contract_write().unwrap();
        let args = &write.args[0];

        assert_eq!(args["value"], "88196830953025947900");
        assert_eq!(args["gasLimit"], "287624");
        assert_eq!(args["nonce"], withdrawal.nonce.to_string());
        assert_eq!(
            args["withdrawalHash"],
            serde_json::to_value(withdrawal.withdrawal_hash).unwrap()
        );
    }

    #[test]
    fn test_explicit_gas_is_used() {
        let write = params().gas(Some(420_000)).contract_write().unwrap();
        let tx = write.transaction_request(ANVIL_ACCOUNT);

        assert_eq!(tx.gas, Some(420_000));
        assert_eq!(tx.from, Some(ANVIL_ACCOUNT));
    }

    #[test]
    fn test_portal_override() {
        let portal = address!("3333333333333333333333333333333333333333");
        let params = params().portal_address(Some(portal));

        assert_eq!(params.resolve_portal().unwrap(), portal);
    }

    #[test]
    fn test_portal_from_l1_chain() {
        assert_eq!(params().chain(Some(1)).resolve_portal().unwrap(), OP_PORTAL);
    }

    #[test]
    fn test_missing_portal() {
        let no_chain = FinalizeWithdrawal::new(Account::Node(ANVIL_ACCOUNT), op_mainnet_withdrawal());
        assert!(matches!(
            no_chain.resolve_portal(),
            Err(ActionError::MissingPortal { .. })
        ));

        // OP Mainnet has no portal on Sepolia
        let wrong_l1 = params().chain(Some(11_155_111));
        assert!(matches!(
            wrong_l1.resolve_portal(),
            Err(ActionError::MissingPortal {
                l1_chain_id: Some(11_155_111),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_finalize_withdrawal() {
        let (asserter, provider) = mocked_provider();
        asserter.push_success(&"0x3bb7c");
        asserter.push_success(&TX_HASH);

        let hash = finalize_withdrawal(&provider, &params()).await.unwrap();
        assert_eq!(hash, TX_HASH);
    }

    #[tokio::test]
    async fn test_finalize_withdrawal_with_chain() {
        let (asserter, provider) = mocked_provider();
        asserter.push_success(&"0x1");
        asserter.push_success(&"0x3bb7c");
        asserter.push_success(&TX_HASH);

        let hash = finalize_withdrawal(&provider, &params().chain(Some(1)))
            .await
            .unwrap();
        assert_eq!(hash, TX_HASH);
    }

    #[tokio::test]
    async fn test_finalize_withdrawal_chain_mismatch() {
        let (asserter, provider) = mocked_provider();
        asserter.push_success(&"0xaa36a7");

        let err = finalize_withdrawal(&provider, &params().chain(Some(1)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::ChainMismatch {
                expected: 1,
                actual: 11_155_111
            }
        ));
    }

    #[tokio::test]
    async fn test_finalize_withdrawal_small_gas() {
        let (asserter, provider) = mocked_provider();
        asserter.push_failure(ErrorPayload {
            code: -32000,
            message: "out of gas: gas required exceeds allowance: 69".into(),
            data: None,
        });

        let err = finalize_withdrawal(&provider, &params().gas(Some(69)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ExecutionErrorKind::OutOfGas));
        let message = err.to_string();
        assert!(message.contains("Transaction creation failed."));
        assert!(message.contains(r#""method":"eth_estimateGas""#));
        assert!(message.contains(r#""gas":"0x45""#));
        assert!(message.contains("gas:   69"));
        assert!(message.contains(
            "function:  finalizeWithdrawalTransaction((uint256,address,address,uint256,uint256,bytes))"
        ));
    }

    #[tokio::test]
    async fn test_finalize_twice_reverts() {
        let (asserter, provider) = mocked_provider();
        asserter.push_failure(ErrorPayload {
            code: 3,
            message: "execution reverted: OptimismPortal: withdrawal has already been finalized"
                .into(),
            data: None,
        });

        let err = finalize_withdrawal(&provider, &params()).await.unwrap_err();
        assert_eq!(
            err.kind(),
            Some(ExecutionErrorKind::Reverted {
                reason: Some("OptimismPortal: withdrawal has already been finalized".to_string())
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_withdrawal_makes_no_requests() {
        let (_asserter, provider) = mocked_provider();
        let mut params = params();
        params.withdrawal.value += U256::from(1);

        let err = finalize_withdrawal(&provider, &params).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidWithdrawal(_)));
    }

    #[tokio::test]
    async fn test_estimate_finalize_withdrawal_gas() {
        let (asserter, provider) = mocked_provider();
        asserter.push_success(&"0x3bb7c");

        let gas = estimate_finalize_withdrawal_gas(&provider, &params())
            .await
            .unwrap();
        assert_eq!(gas, 244_604);
    }

    #[tokio::test]
    async fn test_action_completed_when_finalized() {
        let (asserter, provider) = mocked_provider();
        let action = FinalizeAction::new(provider, params()).unwrap();
        asserter.push_success(&returns(true));

        assert!(action.is_completed().await.unwrap());
    }

    #[tokio::test]
    async fn test_action_not_ready_when_unproven() {
        let (asserter, provider) = mocked_provider();
        let action = FinalizeAction::new(provider, params()).unwrap();
        asserter.push_success(&returns(false));
        asserter.push_success(&returns((Address::ZERO, U256::ZERO)));

        assert!(!action.is_ready().await.unwrap());
    }

    #[tokio::test]
    async fn test_execute_rejects_finalized_withdrawal() {
        let (asserter, provider) = mocked_provider();
        let mut action = FinalizeAction::new(provider, params()).unwrap();
        asserter.push_success(&returns(true));

        let err = action.execute().await.unwrap_err();
        assert!(err.to_string().contains("already finalized"));
    }

    #[tokio::test]
    async fn test_description() {
        let (_asserter, provider) = mocked_provider();
        let action = FinalizeAction::new(provider, params()).unwrap();

        assert_eq!(
            action.withdrawal_hash(),
            b256!("539dfd84b3939c6d2f61e1fbaa176a70e6a433e222093c3fea872ac36527d6ac")
        );
        assert_eq!(
            action.description(),
            format!("Finalizing withdrawal {} on L1", action.withdrawal_hash())
        );
    }
}
