//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the delegated execution pipeline.
//!
//! Use cases:
//! - `TransactionSubmitter`: Nonce / gas / chain ID, sign, broadcast
//! - `ConfirmationPoller`: Bounded receipt polling
//! - `Delegate`: Approve / deposit / redeem through the safe

pub mod confirmation;
pub mod delegate;
pub mod submitter;

pub use confirmation::ConfirmationPoller;
pub use delegate::{Delegate, DelegateSettings, ExecutionReport};
pub use submitter::TransactionSubmitter;
