//! Call Types - Encoded Calldata and Authorization Envelopes
//!
//! Value types that flow through the pipeline: the encoded inner call,
//! the envelope the authorization module re-sends on the safe's behalf,
//! and the vault actions the executor knows how to run.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{hex, Address, Bytes, U256};
use serde::Deserialize;

/// Selector followed by the ABI-encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall(Bytes);

impl EncodedCall {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// First four bytes identifying the target function.
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        let n = self.0.len().min(4);
        selector[..n].copy_from_slice(&self.0[..n]);
        selector
    }

    /// Argument encoding without the selector.
    pub fn arguments(&self) -> &[u8] {
        self.0.get(4..).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl std::fmt::Display for EncodedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_prefixed(&self.0))
    }
}

/// Argument of the authorization module's `execTransaction`.
///
/// `flag` 0 means a plain call (1 would be a delegatecall); `hint` and
/// `extra` are reserved by the module and stay empty here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedCallEnvelope {
    pub flag: U256,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub hint: Bytes,
    pub extra: Bytes,
}

impl AuthorizedCallEnvelope {
    /// Plain call envelope for an inner (to, value, data) triple.
    pub fn call(to: Address, value: U256, data: Bytes) -> Self {
        Self {
            flag: U256::ZERO,
            to,
            value,
            data,
            hint: Bytes::new(),
            extra: Bytes::new(),
        }
    }

    /// Struct value in declaration order, ready for ABI encoding.
    pub fn to_sol_value(&self) -> DynSolValue {
        DynSolValue::Tuple(vec![
            DynSolValue::Uint(self.flag, 256),
            DynSolValue::Address(self.to),
            DynSolValue::Uint(self.value, 256),
            DynSolValue::Bytes(self.data.to_vec()),
            DynSolValue::Bytes(self.hint.to_vec()),
            DynSolValue::Bytes(self.extra.to_vec()),
        ])
    }

    /// Rebuild an envelope from a decoded struct value.
    pub fn from_sol_value(value: &DynSolValue) -> Option<Self> {
        let DynSolValue::Tuple(fields) = value else {
            return None;
        };
        let [flag, to, value, data, hint, extra] = fields.as_slice() else {
            return None;
        };

        Some(Self {
            flag: flag.as_uint()?.0,
            to: to.as_address()?,
            value: value.as_uint()?.0,
            data: Bytes::copy_from_slice(data.as_bytes()?),
            hint: Bytes::copy_from_slice(hint.as_bytes()?),
            extra: Bytes::copy_from_slice(extra.as_bytes()?),
        })
    }
}

/// Vault operation run through the safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAction {
    /// Allow the vault to pull `amount` of the underlying token from the safe.
    Approve { amount: U256 },
    /// Deposit `amount` of the underlying into the vault, shares to the safe.
    Deposit { amount: U256 },
    /// Burn `shares` from the safe, assets back to the safe.
    Redeem { shares: U256 },
}

impl VaultAction {
    pub fn new(kind: ActionKind, amount: U256) -> Self {
        match kind {
            ActionKind::Approve => Self::Approve { amount },
            ActionKind::Deposit => Self::Deposit { amount },
            ActionKind::Redeem => Self::Redeem { shares: amount },
        }
    }

    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Approve { .. } => ActionKind::Approve,
            Self::Deposit { .. } => ActionKind::Deposit,
            Self::Redeem { .. } => ActionKind::Redeem,
        }
    }

    pub const fn amount(&self) -> U256 {
        match self {
            Self::Approve { amount } | Self::Deposit { amount } => *amount,
            Self::Redeem { shares } => *shares,
        }
    }
}

/// Action selector as written in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Approve,
    Deposit,
    Redeem,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Deposit => write!(f, "deposit"),
            Self::Redeem => write!(f, "redeem"),
        }
    }
}
