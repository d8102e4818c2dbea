//! Receipts and Confirmation States
//!
//! A submitted transaction starts in `Submitted` and moves to exactly
//! one terminal state: `Confirmed`, `Reverted` or `TimedOut`.

use alloy::primitives::TxHash;

/// The node's post-inclusion report for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    /// `true` when execution succeeded (status 1).
    pub success: bool,
    pub gas_used: u64,
    pub block_number: Option<u64>,
}

/// Lifecycle of a submitted transaction while it is being watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    Submitted,
    Confirmed,
    Reverted,
    TimedOut,
}

impl ConfirmationState {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Submitted)
    }

    /// Next state after one receipt query (`None` = not yet included).
    pub fn observe(self, receipt: Option<&Receipt>) -> Self {
        match (self, receipt) {
            (Self::Submitted, Some(r)) if r.success => Self::Confirmed,
            (Self::Submitted, Some(_)) => Self::Reverted,
            (state, _) => state,
        }
    }
}

/// Successful terminal outcome of the confirmation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub gas_used: u64,
    pub block_number: Option<u64>,
    /// Receipt queries issued, including the one that saw the receipt.
    pub attempts: u32,
}
