//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml` and the optional ABI overrides,
//! validating all parameters and providing clear error messages
//! for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};

use super::{AppConfig, SchemaConfig};
use crate::domain::schema::{SchemaRegistry, AUTHORIZATION_ABI, TOKEN_ABI, VAULT_ABI};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Build the schema registry, reading any overridden ABI documents from disk.
pub fn load_schemas(schemas: &SchemaConfig) -> Result<SchemaRegistry> {
  let read = |path: Option<&Path>, embedded: &'static str| -> Result<String> {
    match path {
      Some(p) => std::fs::read_to_string(p)
        .with_context(|| format!("Failed to read ABI file: {}", p.display())),
      None => Ok(embedded.to_string()),
    }
  };

  let token = read(schemas.token.as_deref(), TOKEN_ABI)?;
  let vault = read(schemas.vault.as_deref(), VAULT_ABI)?;
  let authorization = read(schemas.authorization.as_deref(), AUTHORIZATION_ABI)?;

  SchemaRegistry::from_documents(&token, &vault, &authorization)
    .context("Failed to parse interface schemas")
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty RPC URL and a positive RPC timeout
/// - Non-zero, distinct safe / module addresses
/// - Sensible gas and polling limits
/// - A parseable action amount
fn validate_config(config: &AppConfig) -> Result<()> {
  // Network validation
  anyhow::ensure!(
    !config.network.rpc_url.is_empty(),
    "RPC URL must not be empty"
  );
  anyhow::ensure!(
    config.network.rpc_timeout_ms > 0,
    "rpc_timeout_ms must be positive"
  );

  // Account validation
  anyhow::ensure!(
    !config.accounts.safe.is_zero(),
    "Safe address must not be the zero address"
  );
  anyhow::ensure!(
    !config.accounts.authorization_module.is_zero(),
    "Authorization module address must not be the zero address"
  );
  anyhow::ensure!(
    config.accounts.safe != config.accounts.authorization_module,
    "Safe and authorization module must be different contracts"
  );
  anyhow::ensure!(
    !config.accounts.private_key_env.is_empty(),
    "private_key_env must name an environment variable"
  );

  // Contract validation
  anyhow::ensure!(
    !config.contracts.token.is_zero() && !config.contracts.vault.is_zero(),
    "Token and vault addresses must be set"
  );

  // Submission / confirmation validation
  anyhow::ensure!(
    config.submission.gas_limit >= 21_000,
    "gas_limit must be at least 21000, got {}",
    config.submission.gas_limit
  );
  anyhow::ensure!(
    config.confirmation.max_attempts > 0,
    "max_attempts must be positive"
  );

  // Action validation
  let action = config.action.to_action()?;
  anyhow::ensure!(
    !action.amount().is_zero(),
    "Action amount must be positive"
  );

  Ok(())
}
