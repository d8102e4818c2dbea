//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (blockchain RPC, key material).
//!
//! Adapter categories:
//! - `chain`: EVM node access and transaction signing via alloy-rs

pub mod chain;
