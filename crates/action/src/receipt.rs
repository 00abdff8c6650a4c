//! Wait for a submitted transaction to be mined.

use crate::error::ActionError;
use alloy_primitives::TxHash;
use alloy_provider::Provider;
use alloy_rpc_types::TransactionReceipt;
use alloy_transport::TransportError;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, info, warn};

/// Polling schedule for `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptOptions {
    /// Delay before the second poll; doubles after each miss
    pub poll_interval: Duration,
    /// Upper bound on the delay between polls
    pub max_delay: Duration,
    /// Total number of polls, including the first
    pub max_attempts: usize,
}

impl Default for ReceiptOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_delay: Duration::from_secs(12),
            max_attempts: 60,
        }
    }
}

impl ReceiptOptions {
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        // ExponentialBackoff yields base^n * factor: 2^n * (interval / 2)
        let interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX);
        let half_interval = (interval_ms / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(half_interval)
            .max_delay(self.max_delay)
            .take(self.max_attempts.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// A mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: ReceiptStatus,
}

impl ConfirmedTransaction {
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ReceiptStatus::Success)
    }
}

impl From<&TransactionReceipt> for ConfirmedTransaction {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            status: if receipt.status() {
                ReceiptStatus::Success
            } else {
                ReceiptStatus::Reverted
            },
        }
    }
}

enum Poll {
    Pending,
    Failed(TransportError),
}

/// Poll until the transaction is mined or the attempts run out.
///
/// A reverted transaction is returned, not treated as an error; check
/// [`ConfirmedTransaction::status`].
pub async fn wait_for_receipt<P>(
    provider: &P,
    tx_hash: TxHash,
    options: ReceiptOptions,
) -> Result<ConfirmedTransaction, ActionError>
where
    P: Provider,
{
    let result = Retry::spawn(options.strategy(), || async {
        match provider.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => Ok(receipt),
            Ok(None) => {
                debug!(%tx_hash, "Receipt not available yet");
                Err(Poll::Pending)
            }
            Err(e) => {
                warn!(%tx_hash, error = %e, "Receipt poll failed, will retry");
                Err(Poll::Failed(e))
            }
        }
    })
    .await;

    let receipt = match result {
        Ok(receipt) => receipt,
        Err(Poll::Pending) => {
            return Err(ActionError::ReceiptTimeout {
                tx_hash,
                attempts: options.max_attempts.max(1),
            })
        }
        Err(Poll::Failed(e)) => return Err(e.into()),
    };

    let confirmed = ConfirmedTransaction::from(&receipt);
    info!(
        %tx_hash,
        block_number = ?confirmed.block_number,
        gas_used = confirmed.gas_used,
        status = ?confirmed.status,
        "Transaction mined"
    );

    Ok(confirmed)
}
