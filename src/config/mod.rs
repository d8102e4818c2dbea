//! Configuration Module - TOML-based Executor Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Addresses, amounts, gas and polling parameters are externalized
//! here; the private key itself is only ever read from the environment.

pub mod loader;

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::Deserialize;

use crate::domain::call::{ActionKind, VaultAction};

/// Top-level executor configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any network call is made.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Executor identity and logging.
  pub executor: ExecutorConfig,
  /// RPC endpoint settings.
  pub network: NetworkConfig,
  /// Safe, authorization module and delegate key source.
  pub accounts: AccountsConfig,
  /// Token and vault contracts.
  pub contracts: ContractConfig,
  /// Transaction envelope parameters.
  #[serde(default)]
  pub submission: SubmissionConfig,
  /// Receipt polling policy.
  #[serde(default)]
  pub confirmation: ConfirmationConfig,
  /// Optional ABI document overrides.
  #[serde(default)]
  pub schemas: SchemaConfig,
  /// The single operation this run executes.
  pub action: ActionConfig,
}

/// Executor identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
  /// Human-readable executor name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
  /// JSON-RPC HTTP endpoint.
  pub rpc_url: String,
  /// Refuse to run against any other chain when set.
  pub expected_chain_id: Option<u64>,
  /// Deadline for each individual RPC call (milliseconds).
  #[serde(default = "default_rpc_timeout")]
  pub rpc_timeout_ms: u64,
}

impl NetworkConfig {
  pub const fn rpc_timeout(&self) -> Duration {
    Duration::from_millis(self.rpc_timeout_ms)
  }
}

/// Accounts taking part in a delegated call.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
  /// Custodial account the authorization module acts for.
  pub safe: Address,
  /// Authorization module every transaction is sent to.
  pub authorization_module: Address,
  /// Environment variable holding the delegate's private key.
  #[serde(default = "default_private_key_env")]
  pub private_key_env: String,
}

/// Token and vault contract addresses.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
  /// Underlying ERC-20 (e.g. WETH).
  pub token: Address,
  /// ERC-4626 savings vault.
  pub vault: Address,
  /// Referral code passed to `deposit`.
  #[serde(default = "default_referral")]
  pub deposit_referral: u16,
}

/// Transaction envelope configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
  /// Gas limit ceiling; large enough for the heaviest supported action.
  #[serde(default = "default_gas_limit")]
  pub gas_limit: u64,
}

impl Default for SubmissionConfig {
  fn default() -> Self {
    Self {
      gas_limit: default_gas_limit(),
    }
  }
}

/// Receipt polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
  /// Wait between receipt queries (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
  /// Receipt queries before giving up.
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
}

impl ConfirmationConfig {
  pub const fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }
}

impl Default for ConfirmationConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms: default_poll_interval(),
      max_attempts: default_max_attempts(),
    }
  }
}

/// ABI document paths; unset entries use the embedded documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
  pub token: Option<PathBuf>,
  pub vault: Option<PathBuf>,
  pub authorization: Option<PathBuf>,
}

/// Operation to run.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
  /// approve | deposit | redeem
  pub kind: ActionKind,
  /// Amount in base units, decimal (or 0x-prefixed hex) string.
  pub amount: String,
}

impl ActionConfig {
  pub fn to_action(&self) -> anyhow::Result<VaultAction> {
    let amount: U256 = self
      .amount
      .trim()
      .parse()
      .map_err(|e| anyhow::anyhow!("Invalid action amount {:?}: {e}", self.amount))?;
    Ok(VaultAction::new(self.kind, amount))
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_rpc_timeout() -> u64 {
  15_000
}

fn default_private_key_env() -> String {
  "DELEGATE_PRIVATE_KEY".to_string()
}

fn default_referral() -> u16 {
  128
}

fn default_gas_limit() -> u64 {
  6_000_000
}

fn default_poll_interval() -> u64 {
  5_000
}

fn default_max_attempts() -> u32 {
  60
}
