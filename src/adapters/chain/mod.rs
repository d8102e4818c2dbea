//! Chain Adapters - EVM Node and Signer Implementations
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - JSON-RPC node calls (nonce, gas price, chain ID, broadcast, receipts)
//! - Local private-key signing of legacy EIP-155 transactions

pub mod provider;
pub mod signer;

pub use provider::RpcNode;
pub use signer::LocalKeySigner;
