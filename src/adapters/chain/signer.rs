//! Local Key Signer - In-process Private Key
//!
//! Implements the `TransactionSigner` port with an alloy
//! `PrivateKeySigner`. Produces legacy transactions signed with
//! EIP-155 replay protection for the envelope's chain ID.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, TxKind};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::domain::transaction::{SignedTransaction, TransactionEnvelope};
use crate::ports::signer::TransactionSigner;

/// Signs with a private key held in memory.
pub struct LocalKeySigner {
    inner: PrivateKeySigner,
}

impl LocalKeySigner {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_hex(key: &str) -> Result<Self> {
        let inner: PrivateKeySigner = key
            .trim()
            .parse()
            .context("Invalid delegate private key")?;
        Ok(Self { inner })
    }

    /// Load the key from an environment variable.
    pub fn from_env(var: &str) -> Result<Self> {
        let key = std::env::var(var).with_context(|| format!("{var} not set"))?;
        Self::from_hex(&key)
    }

    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
        }
    }
}

#[async_trait]
impl TransactionSigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_transaction(&self, envelope: &TransactionEnvelope) -> Result<SignedTransaction> {
        let mut tx = TxLegacy {
            chain_id: Some(envelope.chain_id),
            nonce: envelope.nonce,
            gas_price: envelope.gas_price,
            gas_limit: envelope.gas_limit,
            to: TxKind::Call(envelope.to),
            value: envelope.value,
            input: envelope.data.clone(),
        };

        let signature = self
            .inner
            .sign_transaction_sync(&mut tx)
            .context("ECDSA signing failed")?;

        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let raw = TxEnvelope::from(signed).encoded_2718();

        Ok(SignedTransaction {
            raw: raw.into(),
            hash,
        })
    }
}
