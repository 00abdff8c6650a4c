//! L2→L1 withdrawal records and their lifecycle on the L1 portal.

pub mod events;
pub mod hash;
pub mod state;
pub mod types;

pub use types::{Withdrawal, WithdrawalError, WithdrawalHash, WithdrawalStatus};
