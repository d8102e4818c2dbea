//! RPC Node Provider - alloy-rs 0.9 Connection Management
//!
//! Implements the `ChainNode` port over an HTTP JSON-RPC endpoint.
//! Validates connectivity (and optionally the chain ID) at startup and
//! keeps a single shared provider for every call of the pipeline.
//!
//! In alloy 0.9, `ProviderBuilder::new().on_http()` returns a complex
//! filler type. We store it as a type-erased `dyn Provider` to keep
//! the adapter API clean.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use alloy::transports::http::{Client, Http};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::NetworkConfig;
use crate::domain::receipt::Receipt;
use crate::ports::chain_node::ChainNode;

/// Shared JSON-RPC node connection backed by alloy-rs 0.9.
pub struct RpcNode {
    /// The alloy HTTP provider (type-erased).
    provider: Arc<dyn Provider<Http<Client>> + Send + Sync>,
}

impl RpcNode {
    /// Connect to the configured RPC endpoint.
    ///
    /// When `expected_chain_id` is set, refuses to start against any
    /// other network so a misconfigured URL never receives a signed tx.
    #[instrument(skip_all)]
    pub async fn connect(config: &NetworkConfig) -> Result<Self> {
        let rpc_url: Url = config.rpc_url.parse().context("Invalid RPC URL")?;
        // Host only: paths and query strings often carry API keys.
        let rpc_host = rpc_url.host_str().unwrap_or_default().to_string();

        // alloy 0.9: on_http() is synchronous, returns impl Provider
        let provider = ProviderBuilder::new().on_http(rpc_url);

        let provider: Arc<dyn Provider<Http<Client>> + Send + Sync> = Arc::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if let Some(expected) = config.expected_chain_id {
            anyhow::ensure!(
                chain_id == expected,
                "Expected chain_id={expected}, RPC node reports {chain_id}"
            );
        }

        info!(chain_id, rpc_host = %rpc_host, "Connected to RPC node");

        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainNode for RpcNode {
    #[instrument(skip(self))]
    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let nonce = self
            .provider
            .get_transaction_count(address)
            .pending()
            .await
            .context("eth_getTransactionCount failed")?;

        debug!(%address, nonce, "Pending nonce");
        Ok(nonce)
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .context("eth_gasPrice failed")
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("eth_chainId failed")
    }

    #[instrument(skip_all, fields(bytes = raw.len()))]
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .context("eth_sendRawTransaction rejected")?;

        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .context("eth_getTransactionReceipt failed")?;

        Ok(receipt.map(|r| Receipt {
            tx_hash: r.transaction_hash,
            success: r.status(),
            gas_used: u64::try_from(r.gas_used).unwrap_or(u64::MAX),
            block_number: r.block_number,
        }))
    }
}
