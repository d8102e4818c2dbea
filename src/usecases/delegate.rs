//! Delegate Use Case - Vault Operations Through the Safe
//!
//! Runs approve / deposit / redeem on behalf of the safe. Each
//! operation drives the pipeline exactly once:
//! 1. Encode the inner call against the token or vault schema
//! 2. Wrap it in the authorization module's execute envelope
//! 3. Sign and broadcast from the delegate account
//! 4. Poll for the receipt
//!
//! A broadcast the node never answered still moves on to polling, using
//! the hash of the signed payload.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::domain::call::{EncodedCall, VaultAction};
use crate::domain::encoder::CalldataEncoder;
use crate::domain::error::{EncodingError, PipelineError};
use crate::domain::schema::{SchemaKind, SchemaRegistry};
use crate::domain::wrapper::AuthorizationWrapper;
use crate::ports::chain_node::ChainNode;
use crate::ports::signer::TransactionSigner;

use super::confirmation::ConfirmationPoller;
use super::submitter::TransactionSubmitter;

/// Addresses and pipeline parameters for one delegate.
#[derive(Debug, Clone)]
pub struct DelegateSettings {
  pub safe: Address,
  pub authorization_module: Address,
  pub token: Address,
  pub vault: Address,
  pub deposit_referral: u16,
  pub gas_limit: u64,
  pub rpc_timeout: Duration,
  pub poll_interval: Duration,
  pub max_attempts: u32,
}

impl DelegateSettings {
  pub fn from_config(config: &AppConfig) -> Self {
    Self {
      safe: config.accounts.safe,
      authorization_module: config.accounts.authorization_module,
      token: config.contracts.token,
      vault: config.contracts.vault,
      deposit_referral: config.contracts.deposit_referral,
      gas_limit: config.submission.gas_limit,
      rpc_timeout: config.network.rpc_timeout(),
      poll_interval: config.confirmation.poll_interval(),
      max_attempts: config.confirmation.max_attempts,
    }
  }
}

/// Outcome of a confirmed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
  pub action: VaultAction,
  pub tx_hash: TxHash,
  pub gas_used: u64,
  pub block_number: Option<u64>,
}

/// Executes vault operations for the safe via the authorization module.
pub struct Delegate<N: ChainNode, S: TransactionSigner> {
  token: CalldataEncoder,
  vault: CalldataEncoder,
  wrapper: AuthorizationWrapper,
  submitter: TransactionSubmitter<N, S>,
  poller: ConfirmationPoller<N>,
  settings: DelegateSettings,
  cancel: CancellationToken,
}

impl<N: ChainNode, S: TransactionSigner> Delegate<N, S> {
  /// Create a delegate.
  ///
  /// # Errors
  /// Fails if the authorization schema lacks the execute entry point.
  pub fn new(
    schemas: &SchemaRegistry,
    node: Arc<N>,
    signer: Arc<S>,
    settings: DelegateSettings,
  ) -> Result<Self, EncodingError> {
    let submitter = TransactionSubmitter::new(
      Arc::clone(&node),
      signer,
      settings.authorization_module,
      settings.gas_limit,
      settings.rpc_timeout,
    );
    let poller = ConfirmationPoller::new(
      node,
      settings.poll_interval,
      settings.max_attempts,
      settings.rpc_timeout,
    );

    Ok(Self {
      token: CalldataEncoder::new(schemas.get(SchemaKind::Token)),
      vault: CalldataEncoder::new(schemas.get(SchemaKind::Vault)),
      wrapper: AuthorizationWrapper::new(schemas.get(SchemaKind::Authorization))?,
      submitter,
      poller,
      settings,
      cancel: CancellationToken::new(),
    })
  }

  /// Abort in-flight network calls and polling when `cancel` fires.
  #[must_use]
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Let the vault pull `amount` of the token from the safe.
  pub async fn approve(&self, amount: U256) -> Result<ExecutionReport, PipelineError> {
    self.execute(VaultAction::Approve { amount }).await
  }

  /// Deposit `amount` of the token into the vault; shares go to the safe.
  pub async fn deposit(&self, amount: U256) -> Result<ExecutionReport, PipelineError> {
    self.execute(VaultAction::Deposit { amount }).await
  }

  /// Redeem `shares` from the safe; assets go back to the safe.
  pub async fn redeem(&self, shares: U256) -> Result<ExecutionReport, PipelineError> {
    self.execute(VaultAction::Redeem { shares }).await
  }

  /// Run `action` through the full pipeline.
  #[instrument(skip(self), fields(safe = %self.settings.safe))]
  pub async fn execute(&self, action: VaultAction) -> Result<ExecutionReport, PipelineError> {
    let (target, inner) = self.build_inner_call(action)?;
    let wrapped = self.wrapper.wrap(target, U256::ZERO, &inner)?;

    info!(
      %target,
      inner = %inner,
      sender = %self.submitter.sender(),
      "Executing through authorization module"
    );

    let tx_hash = match self.submitter.submit(wrapped, &self.cancel).await {
      Ok(hash) => hash,
      Err(PipelineError::BroadcastUnknown { tx_hash, .. }) => {
        warn!(%tx_hash, "Polling for the locally signed hash after unanswered broadcast");
        tx_hash
      }
      Err(e) => return Err(e),
    };
    let confirmation = self.poller.wait(tx_hash, &self.cancel).await?;

    Ok(ExecutionReport {
      action,
      tx_hash,
      gas_used: confirmation.gas_used,
      block_number: confirmation.block_number,
    })
  }

  /// Contract the safe should call, and the calldata for it.
  pub fn build_inner_call(&self, action: VaultAction) -> Result<(Address, EncodedCall), EncodingError> {
    let safe = self.settings.safe;
    match action {
      VaultAction::Approve { amount } => {
        Ok((self.settings.token, self.token.approve(self.settings.vault, amount)?))
      }
      VaultAction::Deposit { amount } => Ok((
        self.settings.vault,
        self.vault.deposit(amount, safe, self.settings.deposit_referral)?,
      )),
      VaultAction::Redeem { shares } => {
        Ok((self.settings.vault, self.vault.redeem(shares, safe, safe)?))
      }
    }
  }
}
