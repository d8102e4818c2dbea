//! Pipeline Error Taxonomy
//!
//! Every failure of the encode → wrap → submit → confirm pipeline maps
//! onto one of these variants. The taxonomy keeps three outcomes apart
//! for the operator:
//! - never submitted (encoding, nonce/gas/chain-id fetch, signing, broadcast rejected)
//! - submitted but reverted
//! - submitted but confirmation unknown (timeout, cancellation while polling)
//!
//! A broadcast the node never answered is its own case: the payload may
//! already sit in the node's pool, so the locally signed hash is kept.

use std::time::Duration;

use alloy::primitives::TxHash;
use thiserror::Error;

/// Failure while building calldata from an interface schema.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The interface document could not be parsed.
    #[error("invalid {schema} interface schema: {reason}")]
    Schema { schema: String, reason: String },

    /// The requested function is not declared by the schema.
    #[error("function `{function}` not found in {schema} schema")]
    UnknownFunction { schema: String, function: String },

    /// No declaration of the function takes this many arguments.
    #[error("`{function}` expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// An argument does not match the declared parameter type.
    #[error("argument {index} of `{function}` does not match declared type `{expected}`")]
    TypeMismatch {
        function: String,
        index: usize,
        expected: String,
    },

    /// The ABI encoder rejected the values (e.g. unsupported nesting).
    #[error("failed to encode `{function}`: {reason}")]
    Abi { function: String, reason: String },
}

/// Network interaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    NonceFetch,
    GasPriceFetch,
    ChainIdFetch,
    Broadcast,
    ReceiptFetch,
}

impl std::fmt::Display for NetworkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonceFetch => write!(f, "nonce fetch"),
            Self::GasPriceFetch => write!(f, "gas price fetch"),
            Self::ChainIdFetch => write!(f, "chain id fetch"),
            Self::Broadcast => write!(f, "broadcast"),
            Self::ReceiptFetch => write!(f, "receipt fetch"),
        }
    }
}

/// Error surfaced by any stage of a delegated operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("network error during {stage}: {source:#}")]
    Network {
        stage: NetworkStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to sign transaction: {0:#}")]
    Signing(#[source] anyhow::Error),

    #[error("transaction {tx_hash} reverted (gas used: {gas_used})")]
    TransactionReverted { tx_hash: TxHash, gas_used: u64 },

    #[error("transaction {tx_hash} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { tx_hash: TxHash, attempts: u32 },

    #[error("operation cancelled during {stage}")]
    Cancelled { stage: NetworkStage },

    /// The node did not answer the broadcast within the deadline.
    #[error("broadcast of {tx_hash} unanswered after {deadline:?}, the node may hold the transaction")]
    BroadcastUnknown { tx_hash: TxHash, deadline: Duration },
}

/// Whether a failed operation left a transaction on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    NotSubmitted,
    Submitted,
    /// Broadcast outcome unknown; re-running may execute twice.
    Unknown,
}

impl PipelineError {
    pub fn network(stage: NetworkStage, source: anyhow::Error) -> Self {
        Self::Network { stage, source }
    }

    /// The network stage this error is tagged with, if any.
    pub const fn stage(&self) -> Option<NetworkStage> {
        match self {
            Self::Network { stage, .. } | Self::Cancelled { stage } => Some(*stage),
            Self::BroadcastUnknown { .. } => Some(NetworkStage::Broadcast),
            _ => None,
        }
    }

    /// Hash to follow up on, when one exists.
    pub const fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::TransactionReverted { tx_hash, .. }
            | Self::ConfirmationTimeout { tx_hash, .. }
            | Self::BroadcastUnknown { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }

    /// Where the transaction stood when the operation failed.
    ///
    /// A `Network { Broadcast }` error is an answer from the node
    /// refusing the payload, so nothing was submitted.
    pub const fn submission(&self) -> SubmissionStatus {
        match self {
            Self::TransactionReverted { .. } | Self::ConfirmationTimeout { .. } => {
                SubmissionStatus::Submitted
            }
            Self::Network { stage, .. } | Self::Cancelled { stage } => match stage {
                NetworkStage::ReceiptFetch => SubmissionStatus::Submitted,
                _ => SubmissionStatus::NotSubmitted,
            },
            Self::BroadcastUnknown { .. } => SubmissionStatus::Unknown,
            Self::Encoding(_) | Self::Signing(_) => SubmissionStatus::NotSubmitted,
        }
    }

    /// Whether the transaction may have reached the network.
    ///
    /// `true` whenever re-running the operation could execute it twice.
    pub const fn was_submitted(&self) -> bool {
        !matches!(self.submission(), SubmissionStatus::NotSubmitted)
    }
}
