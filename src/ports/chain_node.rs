//! Chain Node Port - JSON-RPC Node Interface
//!
//! The five node calls the delegate pipeline depends on. Adapters
//! return `anyhow` errors with context; the use-case layer tags them
//! with the pipeline stage that issued the call.

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::domain::receipt::Receipt;

/// Read/write access to an EVM node.
#[async_trait]
pub trait ChainNode: Send + Sync + 'static {
  /// Nonce of `address` including pending transactions.
  async fn pending_nonce(&self, address: Address) -> anyhow::Result<u64>;

  /// Node-suggested legacy gas price in wei.
  async fn gas_price(&self) -> anyhow::Result<u128>;

  /// Chain identifier used for EIP-155 replay protection.
  async fn chain_id(&self) -> anyhow::Result<u64>;

  /// Broadcast a signed, EIP-2718 encoded transaction.
  ///
  /// # Errors
  /// Returns error if the node rejects the transaction.
  async fn send_raw_transaction(&self, raw: &[u8]) -> anyhow::Result<TxHash>;

  /// Receipt for `hash`, or `None` while the transaction is not yet included.
  async fn transaction_receipt(&self, hash: TxHash) -> anyhow::Result<Option<Receipt>>;
}
