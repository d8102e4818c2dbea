//! Transaction Submitter Use Case - Nonce, Gas, Sign, Broadcast
//!
//! Turns a wrapped call into a broadcast transaction addressed to the
//! authorization module.
//!
//! Submission flow (strictly sequential, never retried):
//! 1. Pending nonce of the delegate account
//! 2. Node-suggested gas price
//! 3. Chain ID
//! 4. Assemble the envelope with the configured gas limit
//! 5. Sign
//! 6. Broadcast and return the hash
//!
//! The first failure aborts the submission; later stages never run.
//! Cancellation is honoured up to the broadcast. Once the payload is
//! handed to the node only the RPC deadline can end the call, and an
//! unanswered broadcast is reported with the locally signed hash.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::call::EncodedCall;
use crate::domain::error::{NetworkStage, PipelineError};
use crate::domain::transaction::TransactionEnvelope;
use crate::ports::chain_node::ChainNode;
use crate::ports::signer::TransactionSigner;

/// Run one node call under a deadline, racing the cancellation token.
pub(crate) async fn guarded<T, F>(
  stage: NetworkStage,
  deadline: Duration,
  cancel: &CancellationToken,
  call: F,
) -> Result<T, PipelineError>
where
  F: Future<Output = anyhow::Result<T>>,
{
  tokio::select! {
    biased;
    () = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
    result = tokio::time::timeout(deadline, call) => match result {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => Err(PipelineError::network(stage, e)),
      Err(_) => Err(PipelineError::network(
        stage,
        anyhow::anyhow!("RPC call timed out after {deadline:?}"),
      )),
    },
  }
}

/// Signs and broadcasts transactions from one delegate account.
pub struct TransactionSubmitter<N: ChainNode, S: TransactionSigner> {
  node: Arc<N>,
  signer: Arc<S>,
  /// Authorization module every transaction is addressed to.
  module: Address,
  gas_limit: u64,
  rpc_timeout: Duration,
  /// Held from nonce fetch through broadcast so callers sharing this
  /// account never sign two transactions with the same nonce.
  nonce_lock: Mutex<()>,
}

impl<N: ChainNode, S: TransactionSigner> TransactionSubmitter<N, S> {
  /// Create a new submitter.
  pub fn new(
    node: Arc<N>,
    signer: Arc<S>,
    module: Address,
    gas_limit: u64,
    rpc_timeout: Duration,
  ) -> Self {
    Self {
      node,
      signer,
      module,
      gas_limit,
      rpc_timeout,
      nonce_lock: Mutex::new(()),
    }
  }

  /// Address of the delegate account submitting transactions.
  pub fn sender(&self) -> Address {
    self.signer.address()
  }

  /// Submit `call` to the authorization module with zero value.
  ///
  /// Returns the transaction hash once the node accepted the payload,
  /// or [`PipelineError::BroadcastUnknown`] if the node never answered.
  #[instrument(skip_all, fields(module = %self.module, calldata_len = call.len()))]
  pub async fn submit(
    &self,
    call: EncodedCall,
    cancel: &CancellationToken,
  ) -> Result<TxHash, PipelineError> {
    let _guard = self.nonce_lock.lock().await;
    let sender = self.signer.address();

    let nonce = guarded(
      NetworkStage::NonceFetch,
      self.rpc_timeout,
      cancel,
      self.node.pending_nonce(sender),
    )
    .await?;

    let gas_price = guarded(
      NetworkStage::GasPriceFetch,
      self.rpc_timeout,
      cancel,
      self.node.gas_price(),
    )
    .await?;

    let chain_id = guarded(
      NetworkStage::ChainIdFetch,
      self.rpc_timeout,
      cancel,
      self.node.chain_id(),
    )
    .await?;

    let envelope = TransactionEnvelope::new(self.module, call)
      .with_nonce(nonce)
      .with_gas(self.gas_limit, gas_price)
      .with_chain_id(chain_id);

    debug!(
      %sender,
      nonce,
      gas_price,
      gas_limit = self.gas_limit,
      chain_id,
      "Transaction envelope assembled"
    );

    let signed = self
      .signer
      .sign_transaction(&envelope)
      .await
      .map_err(PipelineError::Signing)?;

    if cancel.is_cancelled() {
      return Err(PipelineError::Cancelled { stage: NetworkStage::Broadcast });
    }

    let broadcast = self.node.send_raw_transaction(&signed.raw);
    let tx_hash = match tokio::time::timeout(self.rpc_timeout, broadcast).await {
      Ok(Ok(hash)) => hash,
      Ok(Err(e)) => return Err(PipelineError::network(NetworkStage::Broadcast, e)),
      Err(_) => {
        warn!(
          tx_hash = %signed.hash,
          nonce,
          deadline = ?self.rpc_timeout,
          "Broadcast unanswered, transaction may be pending"
        );
        return Err(PipelineError::BroadcastUnknown {
          tx_hash: signed.hash,
          deadline: self.rpc_timeout,
        });
      }
    };

    if tx_hash != signed.hash {
      debug!(node = %tx_hash, local = %signed.hash, "Node returned a different hash than signed locally");
    }

    info!(
      tx_hash = %tx_hash,
      nonce,
      gas_price,
      chain_id,
      "Transaction broadcast"
    );

    Ok(tx_hash)
  }
}
