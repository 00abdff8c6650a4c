//! Extract withdrawals from L2 initiation receipts.

use crate::types::Withdrawal;
use alloy_primitives::Log;
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolEvent;
use binding::opstack::{IL2ToL1MessagePasser, WithdrawalTransaction, MESSAGE_PASSER_ADDRESS};
use tracing::warn;

/// Decode a `MessagePassed` log into a withdrawal record.
///
/// Logs not emitted by the message passer predeploy are ignored, as are
/// events whose hash does not match their fields.
pub fn withdrawal_from_log(log: &Log) -> Option<Withdrawal> {
    if log.address != MESSAGE_PASSER_ADDRESS {
        return None;
    }

    let event = IL2ToL1MessagePasser::MessagePassed::decode_log(log).ok()?.data;
    let withdrawal = Withdrawal {
        withdrawal_hash: event.withdrawalHash,
        ..Withdrawal::new(WithdrawalTransaction {
            nonce: event.nonce,
            sender: event.sender,
            target: event.target,
            value: event.value,
            gasLimit: event.gasLimit,
            data: event.data,
        })
    };

    if let Err(e) = withdrawal.verify() {
        warn!(error = %e, "Skipping MessagePassed event");
        return None;
    }

    Some(withdrawal)
}

/// All withdrawals initiated by an L2 transaction.
pub fn withdrawals_from_receipt(receipt: &TransactionReceipt) -> Vec<Withdrawal> {
    receipt
        .logs()
        .iter()
        .filter_map(|log| withdrawal_from_log(&log.inner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_withdrawal_hash;
    use alloy_primitives::{address, Bytes, B256, U256};

    fn message_passed(withdrawal_hash: Option<B256>) -> IL2ToL1MessagePasser::MessagePassed {
        let tx = WithdrawalTransaction {
            nonce: U256::from(7),
            sender: address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
            target: address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
            value: U256::from(1_000_000),
            gasLimit: U256::from(200_000),
            data: Bytes::new(),
        };
        let hash = withdrawal_hash.unwrap_or_else(|| compute_withdrawal_hash(&tx));

        IL2ToL1MessagePasser::MessagePassed {
            nonce: tx.nonce,
            sender: tx.sender,
            target: tx.target,
            value: tx.value,
            gasLimit: tx.gasLimit,
            data: tx.data,
            withdrawalHash: hash,
        }
    }

    #[test]
    fn test_withdrawal_from_log() {
        let event = message_passed(None);
        let log = Log {
            address: MESSAGE_PASSER_ADDRESS,
            data: event.encode_log_data(),
        };

        let withdrawal = withdrawal_from_log(&log).expect("valid MessagePassed log");
        assert_eq!(withdrawal.nonce, U256::from(7));
        assert_eq!(withdrawal.gas_limit, U256::from(200_000));
        assert_eq!(withdrawal.withdrawal_hash, event.withdrawalHash);
    }

    #[test]
    fn test_ignores_other_emitters() {
        let log = Log {
            address: address!("1111111111111111111111111111111111111111"),
            data: message_passed(None).encode_log_data(),
        };

        assert!(withdrawal_from_log(&log).is_none());
    }

    #[test]
    fn test_ignores_hash_mismatch() {
        let log = Log {
            address: MESSAGE_PASSER_ADDRESS,
            data: message_passed(Some(B256::repeat_byte(0x11))).encode_log_data(),
        };

        assert!(withdrawal_from_log(&log).is_none());
    }
}
