mod common;

use alloy::primitives::B256;

use wallet_recovery_adapters::RecoveryAdapterConfig;
use wallet_recovery_core::{
    PollOutcome, ReceiptPoller, TrackedTransactionPatch, TxHashStore, TxStatus,
};

use common::{init_tracing, receipt, ReceiptStep, TestProvider};

fn pending_entry(store: &TxHashStore, id: &str, chain_id: u64) {
    store.add(id, Some(chain_id));
    store.update(
        id,
        &TrackedTransactionPatch {
            hash: Some(B256::repeat_byte(0xab)),
            status: Some(TxStatus::Pending),
            ..Default::default()
        },
    );
}

#[test]
fn successful_send_resolves_to_success_entry() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    store.add("p1", Some(137));
    store.update(
        "p1",
        &TrackedTransactionPatch {
            hash: Some(B256::repeat_byte(0xab)),
            status: Some(TxStatus::Pending),
            ..Default::default()
        },
    );
    provider.script_receipt(ReceiptStep::Found(receipt("0x1")));

    let mut poller = ReceiptPoller::new("p1");
    assert_eq!(poller.tick(&store, &provider), PollOutcome::Resolved(TxStatus::Success));

    let entry = store.get("p1").expect("entry");
    assert_eq!(entry.id.as_deref(), Some("p1"));
    assert_eq!(entry.chain_id, Some(137));
    assert_eq!(entry.hash, Some(B256::repeat_byte(0xab)));
    assert_eq!(entry.status, Some(TxStatus::Success));
    assert_eq!(entry.code.as_deref(), Some("0x1"));
}

#[test]
fn reverted_receipt_marks_failed() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    pending_entry(&store, "p1", 1);
    provider.script_receipt(ReceiptStep::Found(receipt("0x0")));

    let mut poller = ReceiptPoller::new("p1");
    assert_eq!(poller.tick(&store, &provider), PollOutcome::Resolved(TxStatus::Failed));
    assert_eq!(store.status("p1"), Some(TxStatus::Failed));
    assert_eq!(store.get("p1").expect("entry").code.as_deref(), Some("0x0"));
}

#[test]
fn timeout_after_exactly_twenty_attempts() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    pending_entry(&store, "p1", 1);

    let mut poller = ReceiptPoller::new("p1");
    for attempt in 1..20 {
        assert_eq!(poller.tick(&store, &provider), PollOutcome::Rescheduled);
        assert_ne!(
            store.status("p1"),
            Some(TxStatus::Timeout),
            "must not time out at attempt {attempt}"
        );
    }
    assert_eq!(poller.tick(&store, &provider), PollOutcome::TimedOut);
    assert_eq!(store.status("p1"), Some(TxStatus::Timeout));
    assert_eq!(provider.receipt_calls(), 20);
    assert!(!poller.is_active());

    // Budget spent: no further RPC traffic.
    assert_eq!(poller.tick(&store, &provider), PollOutcome::Stopped);
    assert_eq!(provider.receipt_calls(), 20);
}

#[test]
fn terminal_status_stops_polling_without_rpc() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    pending_entry(&store, "p1", 1);
    store.update(
        "p1",
        &TrackedTransactionPatch {
            status: Some(TxStatus::Success),
            ..Default::default()
        },
    );

    let mut poller = ReceiptPoller::new("p1");
    assert_eq!(poller.tick(&store, &provider), PollOutcome::Stopped);
    assert_eq!(provider.receipt_calls(), 0);
}

#[test]
fn request_error_marks_cancelled_and_stops() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    pending_entry(&store, "p1", 1);
    provider.script_receipt(ReceiptStep::Fail("connection reset".to_owned()));

    let mut poller = ReceiptPoller::new("p1");
    assert_eq!(
        poller.tick(&store, &provider),
        PollOutcome::Resolved(TxStatus::Cancelled)
    );
    assert_eq!(store.status("p1"), Some(TxStatus::Cancelled));
    assert!(!poller.is_active());
}

#[test]
fn configured_limits_bound_polling() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    pending_entry(&store, "p1", 1);

    let config = RecoveryAdapterConfig {
        receipt_max_attempts: 3,
        receipt_poll_interval_ms: 250,
        status_poll_interval_ms: 100,
        ..RecoveryAdapterConfig::default()
    };
    let mut poller = config.receipt_poller("p1");
    assert_eq!(poller.max_attempts, 3);
    assert_eq!(poller.interval_ms, 250);

    assert_eq!(poller.tick(&store, &provider), PollOutcome::Rescheduled);
    assert_eq!(poller.tick(&store, &provider), PollOutcome::Rescheduled);
    assert_eq!(poller.tick(&store, &provider), PollOutcome::TimedOut);
    assert_eq!(store.status("p1"), Some(TxStatus::Timeout));
    assert_eq!(provider.receipt_calls(), 3);

    let view = config.status_view(store, "p2", true, |_| {});
    assert_eq!(view.interval_ms, 100);
}

#[test]
fn missing_hash_reschedules_without_rpc() {
    init_tracing();
    let store = TxHashStore::new();
    let provider = TestProvider::new("test-provider");
    store.add("p1", Some(1));

    let mut poller = ReceiptPoller::new("p1");
    assert_eq!(poller.tick(&store, &provider), PollOutcome::Rescheduled);
    assert_eq!(provider.receipt_calls(), 0);
    assert_eq!(poller.attempts, 1);
}
