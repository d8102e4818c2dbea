//! Vault Delegate Executor — Entry Point
//!
//! Runs one vault operation (approve, deposit or redeem) for the safe
//! through the authorization module, then exits.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load the delegate key from the configured env var
//! 4. Parse the interface schemas (embedded or overridden)
//! 5. Connect to the RPC node
//! 6. Run the configured action; SIGINT cancels in-flight calls

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vault_delegate_executor::adapters::chain::{LocalKeySigner, RpcNode};
use vault_delegate_executor::config;
use vault_delegate_executor::ports::TransactionSigner;
use vault_delegate_executor::usecases::{Delegate, DelegateSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config_path =
        std::env::var("VAULT_EXECUTOR_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.executor.log_level)
                }),
        )
        .json()
        .init();

    info!(
        path = %config_path,
        action = %config.action.kind,
        gas_limit = config.submission.gas_limit,
        max_attempts = config.confirmation.max_attempts,
        "Configuration loaded successfully"
    );

    let action = config.action.to_action()?;

    info!(
        name = %config.executor.name,
        version = env!("CARGO_PKG_VERSION"),
        action = %action.kind(),
        amount = %action.amount(),
        safe = %config.accounts.safe,
        module = %config.accounts.authorization_module,
        "Starting vault delegate executor"
    );

    // ── 3. Delegate key from env ────────────────────────────
    let signer = Arc::new(
        LocalKeySigner::from_env(&config.accounts.private_key_env)
            .context("Failed to load delegate key")?,
    );
    info!(delegate = %signer.address(), "Delegate account loaded");

    // ── 4. Interface schemas ────────────────────────────────
    let schemas = config::loader::load_schemas(&config.schemas)?;

    // ── 5. RPC node ─────────────────────────────────────────
    let node = Arc::new(
        RpcNode::connect(&config.network)
            .await
            .context("Failed to connect to RPC node")?,
    );

    // ── 6. Run the action, cancellable via SIGINT ───────────
    let cancel = CancellationToken::new();
    let delegate = Delegate::new(
        &schemas,
        node,
        signer,
        DelegateSettings::from_config(&config),
    )?
    .with_cancellation(cancel.clone());

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("SIGINT received, cancelling operation");
            signal_cancel.cancel();
        }
    });

    match delegate.execute(action).await {
        Ok(report) => {
            info!(
                tx_hash = %report.tx_hash,
                gas_used = report.gas_used,
                block = ?report.block_number,
                "Operation confirmed"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                action = %action.kind(),
                stage = ?e.stage(),
                submission = ?e.submission(),
                tx_hash = ?e.tx_hash(),
                error = %e,
                "Operation failed"
            );
            Err(e.into())
        }
    }
}
