//! Authorization Wrapper - Safe Execution Envelope
//!
//! Wraps an inner (to, value, data) call into the authorization module's
//! `execTransaction(CallData)` entry point so the module re-sends it with
//! the safe as `msg.sender`. The wrapper does not care what the inner
//! call does; approvals, deposits and redemptions all go through here.

use std::sync::Arc;

use alloy::dyn_abi::JsonAbiExt;
use alloy::json_abi::Function;
use alloy::primitives::{Address, U256};

use super::call::{AuthorizedCallEnvelope, EncodedCall};
use super::encoder::CalldataEncoder;
use super::error::EncodingError;
use super::schema::InterfaceSchema;

/// Name of the authorization module's execute entry point.
pub const EXECUTE_FUNCTION: &str = "execTransaction";

#[derive(Debug, Clone)]
pub struct AuthorizationWrapper {
    encoder: CalldataEncoder,
}

impl AuthorizationWrapper {
    /// Fails when the schema does not declare the execute entry point.
    pub fn new(schema: Arc<InterfaceSchema>) -> Result<Self, EncodingError> {
        schema.functions(EXECUTE_FUNCTION)?;
        Ok(Self {
            encoder: CalldataEncoder::new(schema),
        })
    }

    /// Encode `execTransaction((0, to, value, data, "", ""))`.
    pub fn wrap(&self, to: Address, value: U256, data: &EncodedCall) -> Result<EncodedCall, EncodingError> {
        let envelope = AuthorizedCallEnvelope::call(to, value, data.clone().into_bytes());
        self.wrap_envelope(&envelope)
    }

    pub fn wrap_envelope(&self, envelope: &AuthorizedCallEnvelope) -> Result<EncodedCall, EncodingError> {
        self.encoder.encode(EXECUTE_FUNCTION, &[envelope.to_sol_value()])
    }

    /// Selector every wrapped call starts with.
    pub fn selector(&self) -> Result<[u8; 4], EncodingError> {
        Ok(self.execute_fn()?.selector().0)
    }

    /// Decode a wrapped call back into its envelope.
    pub fn unwrap_call(&self, call: &EncodedCall) -> Result<AuthorizedCallEnvelope, EncodingError> {
        let function = self.execute_fn()?;
        let malformed = |reason: String| EncodingError::Abi {
            function: function.signature(),
            reason,
        };

        if call.selector() != function.selector().0 {
            return Err(malformed(format!(
                "selector 0x{} is not the execute selector",
                alloy::primitives::hex::encode(call.selector())
            )));
        }

        let values = function
            .abi_decode_input(call.arguments(), true)
            .map_err(|e| malformed(e.to_string()))?;

        values
            .first()
            .and_then(AuthorizedCallEnvelope::from_sol_value)
            .ok_or_else(|| malformed("argument is not a CallData struct".to_string()))
    }

    fn execute_fn(&self) -> Result<&Function, EncodingError> {
        Ok(&self.encoder.schema().functions(EXECUTE_FUNCTION)?[0])
    }
}
