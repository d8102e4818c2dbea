//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainNode`: JSON-RPC reads and raw transaction broadcast
//! - `TransactionSigner`: Account address and transaction signing

pub mod chain_node;
pub mod signer;

pub use chain_node::ChainNode;
pub use signer::TransactionSigner;
