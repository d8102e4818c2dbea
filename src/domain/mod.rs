//! Domain layer - Calldata construction and pipeline value types.
//!
//! Pure, synchronous logic: schema parsing, ABI encoding, the
//! authorization envelope and the confirmation state machine.
//! Nothing in here touches the network.

pub mod call;
pub mod encoder;
pub mod error;
pub mod receipt;
pub mod schema;
pub mod transaction;
pub mod wrapper;

// Re-export core types for convenience
pub use call::{ActionKind, AuthorizedCallEnvelope, EncodedCall, VaultAction};
pub use encoder::CalldataEncoder;
pub use error::{EncodingError, NetworkStage, PipelineError, SubmissionStatus};
pub use receipt::{Confirmation, ConfirmationState, Receipt};
pub use schema::{InterfaceSchema, SchemaKind, SchemaRegistry};
pub use transaction::{SignedTransaction, TransactionEnvelope};
pub use wrapper::AuthorizationWrapper;
