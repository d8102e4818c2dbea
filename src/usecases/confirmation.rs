//! Confirmation Poller Use Case - Bounded Receipt Polling
//!
//! Watches a broadcast transaction until the node reports a receipt.
//!
//! State machine:
//! - `Submitted` → receipt absent → wait `poll_interval`, query again
//! - `Submitted` → success receipt → `Confirmed`
//! - `Submitted` → failed receipt → `Reverted` (no further polling)
//! - attempts exhausted while `Submitted` → `TimedOut`

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::error::{NetworkStage, PipelineError};
use crate::domain::receipt::{Confirmation, ConfirmationState};
use crate::ports::chain_node::ChainNode;

use super::submitter::guarded;

/// Polls the node for a transaction receipt a bounded number of times.
pub struct ConfirmationPoller<N: ChainNode> {
  node: Arc<N>,
  poll_interval: Duration,
  max_attempts: u32,
  rpc_timeout: Duration,
}

impl<N: ChainNode> ConfirmationPoller<N> {
  /// Create a new poller.
  pub fn new(node: Arc<N>, poll_interval: Duration, max_attempts: u32, rpc_timeout: Duration) -> Self {
    Self {
      node,
      poll_interval,
      max_attempts,
      rpc_timeout,
    }
  }

  /// Poll until `tx_hash` is confirmed, reverted or attempts run out.
  ///
  /// A failed receipt query counts as "not yet included" for that
  /// attempt. There is no wait after the final attempt.
  #[instrument(skip(self, cancel), fields(tx_hash = %tx_hash))]
  pub async fn wait(
    &self,
    tx_hash: TxHash,
    cancel: &CancellationToken,
  ) -> Result<Confirmation, PipelineError> {
    info!(
      max_attempts = self.max_attempts,
      interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX),
      "Waiting for confirmation"
    );

    let mut state = ConfirmationState::Submitted;

    for attempt in 1..=self.max_attempts {
      let receipt = match guarded(
        NetworkStage::ReceiptFetch,
        self.rpc_timeout,
        cancel,
        self.node.transaction_receipt(tx_hash),
      )
      .await
      {
        Ok(receipt) => receipt,
        Err(e @ PipelineError::Cancelled { .. }) => return Err(e),
        Err(e) => {
          warn!(attempt, error = %e, "Receipt query failed");
          None
        }
      };

      state = state.observe(receipt.as_ref());

      match (state, receipt) {
        (ConfirmationState::Confirmed, Some(receipt)) => {
          info!(
            attempt,
            gas_used = receipt.gas_used,
            block = ?receipt.block_number,
            "Transaction confirmed"
          );
          return Ok(Confirmation {
            tx_hash,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
            attempts: attempt,
          });
        }
        (ConfirmationState::Reverted, Some(receipt)) => {
          warn!(attempt, gas_used = receipt.gas_used, "Transaction reverted");
          return Err(PipelineError::TransactionReverted {
            tx_hash,
            gas_used: receipt.gas_used,
          });
        }
        _ => debug!(attempt, "Receipt not yet available"),
      }

      if attempt < self.max_attempts {
        tokio::select! {
          biased;
          () = cancel.cancelled() => {
            return Err(PipelineError::Cancelled { stage: NetworkStage::ReceiptFetch });
          }
          () = tokio::time::sleep(self.poll_interval) => {}
        }
      }
    }

    state = ConfirmationState::TimedOut;
    warn!(?state, attempts = self.max_attempts, "Confirmation timed out");

    Err(PipelineError::ConfirmationTimeout {
      tx_hash,
      attempts: self.max_attempts,
    })
  }
}
