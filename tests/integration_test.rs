//! Integration Tests - Pipeline Behaviour Against a Mocked Node
//!
//! Tests the interaction between usecases, ports, and mock adapters.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{address, keccak256, Address, Bytes, TxHash, U256};
use mockall::mock;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use vault_delegate_executor::adapters::chain::LocalKeySigner;
use vault_delegate_executor::domain::{
    AuthorizationWrapper, CalldataEncoder, EncodedCall, NetworkStage, PipelineError, Receipt,
    SchemaKind, SchemaRegistry, SignedTransaction, SubmissionStatus, TransactionEnvelope,
    VaultAction,
};
use vault_delegate_executor::ports::{ChainNode, TransactionSigner};
use vault_delegate_executor::usecases::{
    ConfirmationPoller, Delegate, DelegateSettings, TransactionSubmitter,
};

// ---- Mock Definitions ----

mock! {
    pub Node {}

    #[async_trait::async_trait]
    impl ChainNode for Node {
        async fn pending_nonce(&self, address: Address) -> anyhow::Result<u64>;
        async fn gas_price(&self) -> anyhow::Result<u128>;
        async fn chain_id(&self) -> anyhow::Result<u64>;
        async fn send_raw_transaction(&self, raw: &[u8]) -> anyhow::Result<TxHash>;
        async fn transaction_receipt(&self, hash: TxHash) -> anyhow::Result<Option<Receipt>>;
    }
}

mock! {
    pub Signer {}

    #[async_trait::async_trait]
    impl TransactionSigner for Signer {
        fn address(&self) -> Address;
        async fn sign_transaction(
            &self,
            envelope: &TransactionEnvelope,
        ) -> anyhow::Result<SignedTransaction>;
    }
}

/// Hand-written node that keeps call order and accepted payloads.
/// Needed where a call must suspend, which `mock!` expectations cannot do.
#[derive(Default)]
struct ScriptedNode {
    events: Mutex<Vec<&'static str>>,
    accepted: Mutex<Vec<Bytes>>,
    /// Delay between storing a broadcast payload and answering.
    broadcast_delay: Duration,
    /// Token fired from inside the broadcast call.
    cancel_on_broadcast: Option<CancellationToken>,
}

impl ScriptedNode {
    fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    fn accepted(&self) -> Vec<Bytes> {
        self.accepted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChainNode for ScriptedNode {
    async fn pending_nonce(&self, _address: Address) -> anyhow::Result<u64> {
        self.record("nonce");
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(self.accepted.lock().unwrap().len() as u64)
    }

    async fn gas_price(&self) -> anyhow::Result<u128> {
        self.record("gas_price");
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(1_000_000_000)
    }

    async fn chain_id(&self) -> anyhow::Result<u64> {
        self.record("chain_id");
        Ok(1)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> anyhow::Result<TxHash> {
        self.record("broadcast");
        self.accepted.lock().unwrap().push(Bytes::copy_from_slice(raw));
        if let Some(cancel) = &self.cancel_on_broadcast {
            cancel.cancel();
        }
        tokio::time::sleep(self.broadcast_delay).await;
        Ok(keccak256(raw))
    }

    async fn transaction_receipt(&self, hash: TxHash) -> anyhow::Result<Option<Receipt>> {
        self.record("receipt");
        let known = self
            .accepted
            .lock()
            .unwrap()
            .iter()
            .any(|raw| keccak256(raw) == hash);
        Ok(known.then(|| receipt(hash, true)))
    }
}

fn decoded_nonce(raw: &Bytes) -> u64 {
    match TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap() {
        TxEnvelope::Legacy(tx) => tx.tx().nonce,
        other => panic!("expected a legacy transaction, got {other:?}"),
    }
}

// ---- Fixtures ----

const MODULE: Address = address!("ad11d63611B133c6659F1C9127c9DD6d4e1aFf0D");
const SAFE: Address = address!("969b37A287bBFb4080E6cb293fB6E21995fd1f83");
const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
const VAULT: Address = address!("fE6eb3b609a7C8352A241f7F3A21CEA4e9209B8f");

fn settings(max_attempts: u32) -> DelegateSettings {
    DelegateSettings {
        safe: SAFE,
        authorization_module: MODULE,
        token: WETH,
        vault: VAULT,
        deposit_referral: 128,
        gas_limit: 6_000_000,
        rpc_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(1),
        max_attempts,
    }
}

fn receipt(hash: TxHash, success: bool) -> Receipt {
    Receipt {
        tx_hash: hash,
        success,
        gas_used: 187_422,
        block_number: Some(21_000_000),
    }
}

fn submitter<S: TransactionSigner>(node: MockNode, signer: S) -> TransactionSubmitter<MockNode, S> {
    TransactionSubmitter::new(
        Arc::new(node),
        Arc::new(signer),
        MODULE,
        6_000_000,
        Duration::from_secs(2),
    )
}

const POLL_INTERVAL: Duration = Duration::from_secs(5);

fn poller(node: MockNode, max_attempts: u32) -> ConfirmationPoller<MockNode> {
    ConfirmationPoller::new(
        Arc::new(node),
        POLL_INTERVAL,
        max_attempts,
        Duration::from_secs(2),
    )
}

fn call() -> EncodedCall {
    EncodedCall::new(vec![0x09, 0x5e, 0xa7, 0xb3])
}

// ---- Submitter: stage isolation ----

#[tokio::test]
async fn test_nonce_failure_stops_before_gas_price() {
    let mut node = MockNode::new();
    node.expect_pending_nonce()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("connection refused")));
    node.expect_gas_price().never();
    node.expect_chain_id().never();
    node.expect_send_raw_transaction().never();

    let mut signer = MockSigner::new();
    signer.expect_address().return_const(Address::repeat_byte(0x01));
    signer.expect_sign_transaction().never();

    let err = submitter(node, signer)
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Network { stage: NetworkStage::NonceFetch, .. }));
    assert!(!err.was_submitted());
}

#[tokio::test]
async fn test_gas_price_failure_stops_before_chain_id() {
    let mut node = MockNode::new();
    node.expect_pending_nonce().times(1).returning(|_| Ok(3));
    node.expect_gas_price()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("rate limited")));
    node.expect_chain_id().never();
    node.expect_send_raw_transaction().never();

    let mut signer = MockSigner::new();
    signer.expect_address().return_const(Address::repeat_byte(0x01));
    signer.expect_sign_transaction().never();

    let err = submitter(node, signer)
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(NetworkStage::GasPriceFetch));
}

#[tokio::test]
async fn test_chain_id_failure_stops_before_signing() {
    let mut node = MockNode::new();
    node.expect_pending_nonce().times(1).returning(|_| Ok(3));
    node.expect_gas_price().times(1).returning(|| Ok(1_000_000_000));
    node.expect_chain_id()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("bad gateway")));
    node.expect_send_raw_transaction().never();

    let mut signer = MockSigner::new();
    signer.expect_address().return_const(Address::repeat_byte(0x01));
    signer.expect_sign_transaction().never();

    let err = submitter(node, signer)
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(NetworkStage::ChainIdFetch));
}

#[tokio::test]
async fn test_signing_failure_never_broadcasts() {
    let mut node = MockNode::new();
    node.expect_pending_nonce().times(1).returning(|_| Ok(3));
    node.expect_gas_price().times(1).returning(|| Ok(1_000_000_000));
    node.expect_chain_id().times(1).returning(|| Ok(1));
    node.expect_send_raw_transaction().never();

    let mut signer = MockSigner::new();
    signer.expect_address().return_const(Address::repeat_byte(0x01));
    signer
        .expect_sign_transaction()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("hsm unavailable")));

    let err = submitter(node, signer)
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Signing(_)));
    assert_eq!(err.stage(), None);
}

#[tokio::test]
async fn test_broadcast_failure_tagged() {
    let mut node = MockNode::new();
    node.expect_pending_nonce().times(1).returning(|_| Ok(3));
    node.expect_gas_price().times(1).returning(|| Ok(1_000_000_000));
    node.expect_chain_id().times(1).returning(|| Ok(1));
    node.expect_send_raw_transaction()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("nonce too low")));
    node.expect_transaction_receipt().never();

    let err = submitter(node, LocalKeySigner::random())
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(NetworkStage::Broadcast));
    assert!(!err.was_submitted());
}

#[tokio::test]
async fn test_envelope_uses_fetched_values() {
    let signer = LocalKeySigner::random();
    let sender = signer.address();

    let mut node = MockNode::new();
    node.expect_pending_nonce()
        .withf(move |addr| *addr == sender)
        .times(1)
        .returning(|_| Ok(42));
    node.expect_gas_price().times(1).returning(|| Ok(7_000_000_000));
    node.expect_chain_id().times(1).returning(|| Ok(1));
    node.expect_send_raw_transaction()
        .withf(|raw| {
            let Ok(TxEnvelope::Legacy(tx)) = TxEnvelope::decode_2718(&mut &raw[..]) else {
                return false;
            };
            let tx = tx.tx();
            tx.nonce == 42
                && tx.gas_price == 7_000_000_000
                && tx.gas_limit == 6_000_000
                && tx.chain_id == Some(1)
                && tx.value == U256::ZERO
                && tx.to.to() == Some(&MODULE)
                && tx.input.as_ref() == &[0x09u8, 0x5e, 0xa7, 0xb3][..]
        })
        .times(1)
        .returning(|raw| Ok(keccak256(raw)));

    let hash = submitter(node, signer)
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap();

    assert_ne!(hash, TxHash::ZERO);
}

#[tokio::test]
async fn test_cancelled_submission_never_broadcasts() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut node = MockNode::new();
    node.expect_pending_nonce().returning(|_| Ok(0));
    node.expect_gas_price().never();
    node.expect_send_raw_transaction().never();

    let err = submitter(node, LocalKeySigner::random())
        .submit(call(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { stage: NetworkStage::NonceFetch }));
}

#[tokio::test]
async fn test_unanswered_broadcast_reports_signed_hash() {
    let node = Arc::new(ScriptedNode {
        broadcast_delay: Duration::from_millis(200),
        ..Default::default()
    });
    let submitter = TransactionSubmitter::new(
        Arc::clone(&node),
        Arc::new(LocalKeySigner::random()),
        MODULE,
        6_000_000,
        Duration::from_millis(20),
    );

    let err = submitter
        .submit(call(), &CancellationToken::new())
        .await
        .unwrap_err();

    let accepted = node.accepted();
    assert_eq!(accepted.len(), 1);
    assert!(matches!(err, PipelineError::BroadcastUnknown { .. }), "got: {err}");
    assert_eq!(err.tx_hash(), Some(keccak256(&accepted[0])));
    assert_eq!(err.submission(), SubmissionStatus::Unknown);
    assert!(err.was_submitted());
}

#[tokio::test]
async fn test_cancellation_does_not_abandon_broadcast() {
    let cancel = CancellationToken::new();
    let node = Arc::new(ScriptedNode {
        broadcast_delay: Duration::from_millis(10),
        cancel_on_broadcast: Some(cancel.clone()),
        ..Default::default()
    });
    let submitter = TransactionSubmitter::new(
        Arc::clone(&node),
        Arc::new(LocalKeySigner::random()),
        MODULE,
        6_000_000,
        Duration::from_secs(2),
    );

    let hash = assert_ok!(submitter.submit(call(), &cancel).await);

    assert!(cancel.is_cancelled());
    assert_eq!(hash, keccak256(&node.accepted()[0]));
}

#[tokio::test]
async fn test_concurrent_submissions_hold_nonce_until_broadcast() {
    let node = Arc::new(ScriptedNode::default());
    let submitter = TransactionSubmitter::new(
        Arc::clone(&node),
        Arc::new(LocalKeySigner::random()),
        MODULE,
        6_000_000,
        Duration::from_secs(2),
    );
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(
        submitter.submit(call(), &cancel),
        submitter.submit(call(), &cancel),
    );
    assert_ne!(first.unwrap(), second.unwrap());

    assert_eq!(
        node.events(),
        [
            "nonce", "gas_price", "chain_id", "broadcast",
            "nonce", "gas_price", "chain_id", "broadcast",
        ]
    );

    let nonces: Vec<u64> = node.accepted().iter().map(decoded_nonce).collect();
    assert_eq!(nonces, [0, 1]);
}

// ---- Poller: scripted receipt sequences ----

#[tokio::test(start_paused = true)]
async fn test_poller_confirms_on_third_poll() {
    let hash = TxHash::repeat_byte(0x33);
    let polls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&polls);

    let mut node = MockNode::new();
    node.expect_transaction_receipt()
        .times(3)
        .returning(move |h| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok((n >= 2).then(|| receipt(h, true)))
        });

    let started = tokio::time::Instant::now();
    let confirmation = poller(node, 60)
        .wait(hash, &CancellationToken::new())
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= POLL_INTERVAL * 2 && elapsed < POLL_INTERVAL * 3, "{elapsed:?}");
    assert_eq!(polls.load(Ordering::SeqCst), 3);
    assert_eq!(confirmation.attempts, 3);
    assert_eq!(confirmation.gas_used, 187_422);
    assert_eq!(confirmation.tx_hash, hash);
}

#[tokio::test(start_paused = true)]
async fn test_poller_revert_stops_after_one_poll() {
    let hash = TxHash::repeat_byte(0x44);

    let mut node = MockNode::new();
    node.expect_transaction_receipt()
        .times(1)
        .returning(|h| Ok(Some(receipt(h, false))));

    let err = poller(node, 60)
        .wait(hash, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        PipelineError::TransactionReverted { tx_hash, gas_used } => {
            assert_eq!(tx_hash, hash);
            assert_eq!(gas_used, 187_422);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_poller_times_out_after_max_attempts() {
    let mut node = MockNode::new();
    node.expect_transaction_receipt().times(4).returning(|_| Ok(None));

    let started = tokio::time::Instant::now();
    let err = poller(node, 4)
        .wait(TxHash::repeat_byte(0x55), &CancellationToken::new())
        .await
        .unwrap_err();

    // No sleep after the final attempt.
    let elapsed = started.elapsed();
    assert!(elapsed >= POLL_INTERVAL * 3 && elapsed < POLL_INTERVAL * 4, "{elapsed:?}");
    assert!(matches!(err, PipelineError::ConfirmationTimeout { attempts: 4, .. }));
    assert!(err.was_submitted());
}

#[tokio::test(start_paused = true)]
async fn test_poller_treats_query_errors_as_absent() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let mut node = MockNode::new();
    node.expect_transaction_receipt()
        .times(2)
        .returning(move |h| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow::anyhow!("upstream timeout"))
            } else {
                Ok(Some(receipt(h, true)))
            }
        });

    let confirmation = poller(node, 5)
        .wait(TxHash::repeat_byte(0x66), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(confirmation.attempts, 2);
}

#[tokio::test]
async fn test_poller_cancellation_interrupts_wait() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let mut node = MockNode::new();
    node.expect_transaction_receipt().times(1).returning(move |_| {
        trigger.cancel();
        Ok(None)
    });

    let err = ConfirmationPoller::new(
        Arc::new(node),
        Duration::from_secs(3600),
        60,
        Duration::from_secs(2),
    )
    .wait(TxHash::repeat_byte(0x77), &cancel)
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { stage: NetworkStage::ReceiptFetch }));
}

// ---- Delegate: full pipeline ----

#[tokio::test]
async fn test_redeem_end_to_end() {
    let schemas = SchemaRegistry::builtin().unwrap();
    let wrapper = AuthorizationWrapper::new(schemas.get(SchemaKind::Authorization)).unwrap();
    let shares = U256::from(9_999_376_887_387_850u64);
    let expected_inner = CalldataEncoder::new(schemas.get(SchemaKind::Vault))
        .redeem(shares, SAFE, SAFE)
        .unwrap();

    let mut node = MockNode::new();
    node.expect_pending_nonce().times(1).returning(|_| Ok(5));
    node.expect_gas_price().times(1).returning(|| Ok(1_000_000_000));
    node.expect_chain_id().times(1).returning(|| Ok(1));
    node.expect_send_raw_transaction()
        .withf(move |raw| {
            let Ok(TxEnvelope::Legacy(tx)) = TxEnvelope::decode_2718(&mut &raw[..]) else {
                return false;
            };
            let outer = EncodedCall::new(tx.tx().input.clone());
            wrapper.unwrap_call(&outer).is_ok_and(|envelope| {
                envelope.to == VAULT
                    && envelope.value == U256::ZERO
                    && envelope.data.as_ref() == expected_inner.as_bytes()
                    && envelope.hint.is_empty()
                    && envelope.extra.is_empty()
            })
        })
        .times(1)
        .returning(|raw| Ok(keccak256(raw)));
    node.expect_transaction_receipt()
        .times(1)
        .returning(|h| Ok(Some(receipt(h, true))));

    let delegate = Delegate::new(
        &schemas,
        Arc::new(node),
        Arc::new(LocalKeySigner::random()),
        settings(60),
    )
    .unwrap();

    let report = assert_ok!(delegate.redeem(shares).await);

    assert_eq!(report.action, VaultAction::Redeem { shares });
    assert_eq!(report.gas_used, 187_422);
    assert_eq!(report.block_number, Some(21_000_000));
}

#[test]
fn test_approve_targets_token_with_vault_as_spender() {
    let schemas = SchemaRegistry::builtin().unwrap();
    let delegate = Delegate::new(
        &schemas,
        Arc::new(MockNode::new()),
        Arc::new(LocalKeySigner::random()),
        settings(60),
    )
    .unwrap();

    let amount = U256::from(10_000_000_000_000_000u64);
    let (target, inner) = delegate
        .build_inner_call(VaultAction::Approve { amount })
        .unwrap();

    assert_eq!(target, WETH);
    assert_eq!(
        inner.to_string(),
        "0x095ea7b3000000000000000000000000fe6eb3b609a7c8352a241f7f3a21cea4e9209b8f000000000000000000000000000000000000000000000000002386f26fc10000"
    );
}

#[tokio::test]
async fn test_deposit_reverted_is_reported_as_submitted() {
    let schemas = SchemaRegistry::builtin().unwrap();

    let mut node = MockNode::new();
    node.expect_pending_nonce().times(1).returning(|_| Ok(0));
    node.expect_gas_price().times(1).returning(|| Ok(1));
    node.expect_chain_id().times(1).returning(|| Ok(31_337));
    node.expect_send_raw_transaction()
        .times(1)
        .returning(|raw| Ok(keccak256(raw)));
    node.expect_transaction_receipt()
        .times(1)
        .returning(|h| Ok(Some(receipt(h, false))));

    let delegate = Delegate::new(
        &schemas,
        Arc::new(node),
        Arc::new(LocalKeySigner::random()),
        settings(60),
    )
    .unwrap();

    let err = assert_err!(delegate.deposit(U256::from(1u64)).await);
    assert!(matches!(err, PipelineError::TransactionReverted { .. }));
    assert!(err.was_submitted());
}

#[tokio::test]
async fn test_unanswered_broadcast_falls_through_to_polling() {
    let schemas = SchemaRegistry::builtin().unwrap();
    let node = Arc::new(ScriptedNode {
        broadcast_delay: Duration::from_millis(200),
        ..Default::default()
    });

    let delegate = Delegate::new(
        &schemas,
        Arc::clone(&node),
        Arc::new(LocalKeySigner::random()),
        DelegateSettings {
            rpc_timeout: Duration::from_millis(20),
            ..settings(60)
        },
    )
    .unwrap();

    let report = assert_ok!(delegate.deposit(U256::from(1_000u64)).await);

    assert_eq!(report.tx_hash, keccak256(&node.accepted()[0]));
    assert_eq!(node.events().last(), Some(&"receipt"));
}
