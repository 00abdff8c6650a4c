pub mod config;

use crate::config::Config;
use action::FinalizeWithdrawal;
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use client::Account;
use std::path::Path;
use tracing::info;
use withdrawal::{state::WithdrawalStateProvider, Withdrawal, WithdrawalStatus};

/// Load a withdrawal record from a JSON file.
pub fn load_withdrawal(path: impl AsRef<Path>) -> eyre::Result<Withdrawal> {
    let contents = std::fs::read_to_string(path)?;
    let withdrawal: Withdrawal = serde_json::from_str(&contents)?;

    Ok(withdrawal)
}

/// Finalize parameters from the config plus command-line overrides.
pub fn finalize_params(
    config: &Config,
    account: Account,
    withdrawal: Withdrawal,
    gas: Option<u64>,
    portal_address: Option<Address>,
) -> eyre::Result<FinalizeWithdrawal> {
    let mut params = FinalizeWithdrawal::new(account, withdrawal)
        .gas(gas)
        .chain(config.l1_chain_id)
        .portal_address(portal_address.or(config.portal_address));

    if let Some(chain) = config.target_chain()? {
        params = params.target_chain(chain);
    }

    Ok(params)
}

/// Where a withdrawal is in its lifecycle, and how long until it can be
/// finalized once proven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalReport {
    pub status: WithdrawalStatus,
    pub seconds_until_finalizable: Option<u64>,
}

pub async fn withdrawal_status<P>(
    provider: P,
    params: &FinalizeWithdrawal,
) -> eyre::Result<WithdrawalReport>
where
    P: Provider + Clone,
{
    let portal = params.resolve_portal()?;
    let state = WithdrawalStateProvider::new(provider, portal);
    let hash = params.withdrawal.withdrawal_hash;
    let submitter = params.account.address();

    let status = state.query_withdrawal_status(hash, submitter).await?;
    let seconds_until_finalizable = match status {
        WithdrawalStatus::Proven { .. } => state.seconds_until_finalizable(hash, submitter).await?,
        _ => None,
    };

    info!(
        withdrawal_hash = %hash,
        portal = %portal,
        status = ?status,
        seconds_until_finalizable = ?seconds_until_finalizable,
        "Queried withdrawal status"
    );

    Ok(WithdrawalReport {
        status,
        seconds_until_finalizable,
    })
}

/// Withdrawals initiated by an L2 transaction.
pub async fn extract_withdrawals<P>(l2_provider: &P, tx_hash: TxHash) -> eyre::Result<Vec<Withdrawal>>
where
    P: Provider,
{
    let receipt = l2_provider
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or_else(|| eyre::eyre!("No receipt for L2 transaction {tx_hash}"))?;

    let withdrawals = withdrawal::events::withdrawals_from_receipt(&receipt);
    info!(%tx_hash, count = withdrawals.len(), "Extracted withdrawals");

    Ok(withdrawals)
}
