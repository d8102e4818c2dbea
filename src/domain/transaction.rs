//! Transaction Envelopes
//!
//! The unsigned legacy (EIP-155) transaction the delegate sends to the
//! authorization module, and its signed, broadcast-ready form.

use alloy::primitives::{Address, Bytes, TxHash, U256};

use super::call::EncodedCall;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub nonce: u64,
    /// Always the authorization module.
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    /// Wei per gas, as suggested by the node.
    pub gas_price: u128,
    pub chain_id: u64,
    pub data: Bytes,
}

impl TransactionEnvelope {
    pub fn new(to: Address, call: EncodedCall) -> Self {
        Self {
            nonce: 0,
            to,
            value: U256::ZERO,
            gas_limit: 0,
            gas_price: 0,
            chain_id: 0,
            data: call.into_bytes(),
        }
    }

    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub const fn with_gas(mut self, gas_limit: u64, gas_price: u128) -> Self {
        self.gas_limit = gas_limit;
        self.gas_price = gas_price;
        self
    }

    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }
}

/// Signed transaction bytes (EIP-2718 encoding) and their hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub hash: TxHash,
}
