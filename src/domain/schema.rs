//! Interface Schemas - Contract ABI Registry
//!
//! Parses the token, vault and authorization-module JSON ABI documents
//! once and hands out shared, immutable handles. Encoders receive their
//! schema at construction instead of reaching for a global, so a
//! deployment can swap or version the documents through config.

use std::sync::Arc;

use alloy::json_abi::{Function, JsonAbi};

use super::error::EncodingError;

/// Embedded ERC-20 (WETH) interface.
pub const TOKEN_ABI: &str = include_str!("../../abis/token.abi.json");
/// Embedded ERC-4626 savings vault interface.
pub const VAULT_ABI: &str = include_str!("../../abis/vault.abi.json");
/// Embedded authorization module interface.
pub const AUTHORIZATION_ABI: &str = include_str!("../../abis/authorization.abi.json");

/// Which contract a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Token,
    Vault,
    Authorization,
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Vault => write!(f, "vault"),
            Self::Authorization => write!(f, "authorization"),
        }
    }
}

/// Parsed function signatures for one contract.
#[derive(Debug, Clone)]
pub struct InterfaceSchema {
    name: String,
    abi: JsonAbi,
}

impl InterfaceSchema {
    /// Parse a JSON ABI document.
    pub fn parse(name: impl Into<String>, document: &str) -> Result<Self, EncodingError> {
        let name = name.into();
        let abi: JsonAbi = serde_json::from_str(document).map_err(|e| EncodingError::Schema {
            schema: name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { name, abi })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All declarations (overloads included) of `function`.
    pub fn functions(&self, function: &str) -> Result<&[Function], EncodingError> {
        self.abi
            .function(function)
            .map(Vec::as_slice)
            .filter(|overloads| !overloads.is_empty())
            .ok_or_else(|| EncodingError::UnknownFunction {
                schema: self.name.clone(),
                function: function.to_string(),
            })
    }

    /// Canonical signatures of every declared function, e.g. `approve(address,uint256)`.
    pub fn signatures(&self) -> Vec<String> {
        self.abi.functions().map(Function::signature).collect()
    }
}

/// The three interface schemas this executor works with.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    token: Arc<InterfaceSchema>,
    vault: Arc<InterfaceSchema>,
    authorization: Arc<InterfaceSchema>,
}

impl SchemaRegistry {
    /// Build the registry from the ABI documents compiled into the binary.
    pub fn builtin() -> Result<Self, EncodingError> {
        Self::from_documents(TOKEN_ABI, VAULT_ABI, AUTHORIZATION_ABI)
    }

    /// Build the registry from raw JSON ABI documents.
    pub fn from_documents(
        token: &str,
        vault: &str,
        authorization: &str,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            token: Arc::new(InterfaceSchema::parse(SchemaKind::Token.to_string(), token)?),
            vault: Arc::new(InterfaceSchema::parse(SchemaKind::Vault.to_string(), vault)?),
            authorization: Arc::new(InterfaceSchema::parse(
                SchemaKind::Authorization.to_string(),
                authorization,
            )?),
        })
    }

    pub fn get(&self, kind: SchemaKind) -> Arc<InterfaceSchema> {
        match kind {
            SchemaKind::Token => Arc::clone(&self.token),
            SchemaKind::Vault => Arc::clone(&self.vault),
            SchemaKind::Authorization => Arc::clone(&self.authorization),
        }
    }
}
