use crate::types::{ProvenWithdrawal, WithdrawalHash, WithdrawalStatus};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::IOptimismPortal2;
use tracing::debug;

/// Reads a withdrawal's lifecycle from the L1 portal.
pub struct WithdrawalStateProvider<P> {
    l1_provider: P,
    portal_address: Address,
}

impl<P> WithdrawalStateProvider<P>
where
    P: Provider + Clone,
{
    pub const fn new(l1_provider: P, portal_address: Address) -> Self {
        Self {
            l1_provider,
            portal_address,
        }
    }

    pub const fn portal_address(&self) -> Address {
        self.portal_address
    }

    pub async fn query_withdrawal_status(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> eyre::Result<WithdrawalStatus> {
        if self.is_finalized(hash).await? {
            return Ok(WithdrawalStatus::Finalized);
        }

        if let Some(proven) = self.is_proven(hash, proof_submitter).await? {
            return Ok(WithdrawalStatus::Proven {
                timestamp: proven.timestamp,
            });
        }

        Ok(WithdrawalStatus::Initiated)
    }

    pub async fn is_finalized(&self, hash: WithdrawalHash) -> eyre::Result<bool> {
        let portal = IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        let finalized = portal.finalizedWithdrawals(hash).call().await?;
        Ok(finalized)
    }

    pub async fn is_proven(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> eyre::Result<Option<ProvenWithdrawal>> {
        let portal = IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        let proven = portal
            .provenWithdrawals(hash, proof_submitter)
            .call()
            .await?;

        if proven.timestamp == 0 {
            Ok(None)
        } else {
            Ok(Some(ProvenWithdrawal {
                dispute_game_proxy: proven.disputeGameProxy,
                timestamp: proven.timestamp,
            }))
        }
    }

    /// Get the proof maturity delay from the portal contract.
    pub async fn proof_maturity_delay(&self) -> eyre::Result<u64> {
        let portal = IOptimismPortal2::new(self.portal_address, &self.l1_provider);
        let delay: U256 = portal.proofMaturityDelaySeconds().call().await?;
        Ok(delay.try_into().unwrap_or(u64::MAX))
    }

    /// Get the current L1 block timestamp.
    pub async fn current_timestamp(&self) -> eyre::Result<u64> {
        let block = self
            .l1_provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| eyre::eyre!("Failed to get latest block"))?;
        Ok(block.header.timestamp)
    }

    /// Seconds until a proven withdrawal can be finalized.
    ///
    /// `None` when it has not been proven by `proof_submitter`, `Some(0)` once
    /// the maturity delay has passed.
    pub async fn seconds_until_finalizable(
        &self,
        hash: WithdrawalHash,
        proof_submitter: Address,
    ) -> eyre::Result<Option<u64>> {
        let Some(proven) = self.is_proven(hash, proof_submitter).await? else {
            return Ok(None);
        };

        let maturity_delay = self.proof_maturity_delay().await?;
        let now = self.current_timestamp().await?;
        let ready_at = proven.timestamp.saturating_add(maturity_delay);

        debug!(
            withdrawal_hash = %hash,
            proven_at = proven.timestamp,
            ready_at,
            now,
            "Checked proof maturity"
        );

        Ok(Some(ready_at.saturating_sub(now)))
    }
}
