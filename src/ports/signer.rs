//! Signer Port - Transaction Signing Capability
//!
//! Key storage stays behind this trait so a local key, a hardware
//! module or a remote signer can be swapped in without touching the
//! submission logic.

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::domain::transaction::{SignedTransaction, TransactionEnvelope};

#[async_trait]
pub trait TransactionSigner: Send + Sync + 'static {
  /// Account address derived from the signing key (sender and nonce owner).
  fn address(&self) -> Address;

  /// Sign `envelope` for its `chain_id`.
  async fn sign_transaction(&self, envelope: &TransactionEnvelope) -> anyhow::Result<SignedTransaction>;
}
