//! Calldata Encoder - Schema-driven ABI Encoding
//!
//! Turns a function name plus typed arguments into `selector || args`
//! using the declarations of an injected [`InterfaceSchema`]. Argument
//! types are checked against the schema before anything is encoded, so
//! a `uint16` referral passed as `uint256` fails loudly instead of
//! producing calldata for a different overload.

use std::sync::Arc;

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::Function;
use alloy::primitives::{Address, U256};

use super::call::EncodedCall;
use super::error::EncodingError;
use super::schema::InterfaceSchema;

/// Encodes calls against a single contract interface.
#[derive(Debug, Clone)]
pub struct CalldataEncoder {
    schema: Arc<InterfaceSchema>,
}

impl CalldataEncoder {
    pub fn new(schema: Arc<InterfaceSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &InterfaceSchema {
        &self.schema
    }

    /// Encode a call to `function` with `args`.
    ///
    /// Overloads are resolved by arity first, then by argument types; the
    /// first declaration that accepts every argument wins.
    pub fn encode(&self, function: &str, args: &[DynSolValue]) -> Result<EncodedCall, EncodingError> {
        let overloads = self.schema.functions(function)?;

        let candidates: Vec<&Function> = overloads
            .iter()
            .filter(|f| f.inputs.len() == args.len())
            .collect();

        let Some(first) = candidates.first() else {
            return Err(EncodingError::ArityMismatch {
                function: function.to_string(),
                expected: overloads[0].inputs.len(),
                actual: args.len(),
            });
        };

        let mut first_mismatch = None;
        for candidate in &candidates {
            match self.check_types(candidate, args)? {
                None => return encode_with(candidate, args),
                Some(mismatch) => {
                    first_mismatch.get_or_insert(mismatch);
                }
            }
        }

        let (index, expected) = first_mismatch.unwrap_or_else(|| (0, first.signature()));
        Err(EncodingError::TypeMismatch {
            function: function.to_string(),
            index,
            expected,
        })
    }

    /// `approve(address spender, uint256 amount)`
    pub fn approve(&self, spender: Address, amount: U256) -> Result<EncodedCall, EncodingError> {
        self.encode(
            "approve",
            &[DynSolValue::Address(spender), DynSolValue::Uint(amount, 256)],
        )
    }

    /// `deposit(uint256 assets, address receiver, uint16 referral)`
    pub fn deposit(
        &self,
        assets: U256,
        receiver: Address,
        referral: u16,
    ) -> Result<EncodedCall, EncodingError> {
        self.encode(
            "deposit",
            &[
                DynSolValue::Uint(assets, 256),
                DynSolValue::Address(receiver),
                DynSolValue::Uint(U256::from(referral), 16),
            ],
        )
    }

    /// `redeem(uint256 shares, address receiver, address owner)`
    pub fn redeem(
        &self,
        shares: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<EncodedCall, EncodingError> {
        self.encode(
            "redeem",
            &[
                DynSolValue::Uint(shares, 256),
                DynSolValue::Address(receiver),
                DynSolValue::Address(owner),
            ],
        )
    }

    /// Index and declared type of the first argument `function` rejects.
    fn check_types(
        &self,
        function: &Function,
        args: &[DynSolValue],
    ) -> Result<Option<(usize, String)>, EncodingError> {
        for (index, (param, arg)) in function.inputs.iter().zip(args).enumerate() {
            let ty: DynSolType = param.resolve().map_err(|e| EncodingError::Schema {
                schema: self.schema.name().to_string(),
                reason: format!("{}: {e}", function.signature()),
            })?;

            if !ty.matches(arg) {
                return Ok(Some((index, ty.sol_type_name().into_owned())));
            }
        }
        Ok(None)
    }
}

fn encode_with(function: &Function, args: &[DynSolValue]) -> Result<EncodedCall, EncodingError> {
    function
        .abi_encode_input(args)
        .map(EncodedCall::new)
        .map_err(|e| EncodingError::Abi {
            function: function.signature(),
            reason: e.to_string(),
        })
}
