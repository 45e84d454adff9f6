mod common;

use std::sync::{Arc, Mutex};

use alloy::primitives::{Bytes, U256};

use wallet_recovery_adapters::InMemoryManagerAdapter;
use wallet_recovery_core::{
    Call, ExecuteOutcome, ExecuteRecoveryFlow, HandlerKind, RelayerKind, RelayerOption,
    SignatureRequest, SignerElement, SignerState,
};

use common::{init_tracing, recipient, recovery_wallet, wallet_signer};

fn sample_calls() -> Vec<Call> {
    vec![Call::with_defaults(
        recipient(),
        U256::from(1_000u64),
        Bytes::new(),
    )]
}

fn cancel_log() -> (Arc<Mutex<Vec<String>>>, impl FnMut(&str) + Send + 'static) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_in = Arc::clone(&log);
    (log, move |reason: &str| {
        log_in
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(reason.to_owned());
    })
}

fn ready_update(request_id: &str) -> SignatureRequest {
    SignatureRequest {
        request_id: request_id.to_owned(),
        signers: vec![SignerElement {
            address: wallet_signer(),
            handler_kind: HandlerKind::RecoveryExtension,
            state: SignerState::Ready,
        }],
    }
}

#[test]
fn prefers_relayer_matching_connected_provider() {
    init_tracing();
    let manager = InMemoryManagerAdapter::new();
    manager
        .debug_set_relayer_options(vec![
            RelayerOption {
                option_id: "standard-free".to_owned(),
                relayer_id: None,
                kind: RelayerKind::Standard,
                fee_required: false,
            },
            RelayerOption {
                option_id: "ext-1".to_owned(),
                relayer_id: Some("provider-x".to_owned()),
                kind: RelayerKind::External,
                fee_required: false,
            },
        ])
        .expect("set options");

    let (_log, on_cancel) = cancel_log();
    let mut flow = ExecuteRecoveryFlow::new(manager.clone(), on_cancel);
    let tx_id = flow
        .execute(
            recovery_wallet(),
            &sample_calls(),
            U256::from(7u64),
            5,
            137,
            "provider-x",
        )
        .expect("execute");

    assert_eq!(tx_id, "tx-1");
    let selections = manager.debug_relayer_selections().expect("selections");
    assert_eq!(selections, vec![("tx-1".to_owned(), "ext-1".to_owned())]);
    assert_eq!(flow.pending_request_id(), Some("sig-req-1"));
}

#[test]
fn falls_back_to_free_standard_relayer() {
    init_tracing();
    let manager = InMemoryManagerAdapter::new();
    let (_log, on_cancel) = cancel_log();
    let mut flow = ExecuteRecoveryFlow::new(manager.clone(), on_cancel);
    flow.execute(
        recovery_wallet(),
        &sample_calls(),
        U256::from(7u64),
        5,
        137,
        "provider-without-relayer",
    )
    .expect("execute");

    let selections = manager.debug_relayer_selections().expect("selections");
    assert_eq!(selections[0].1, "standard-free");
}

#[test]
fn no_free_relayer_deletes_transaction_and_errors() {
    init_tracing();
    let manager = InMemoryManagerAdapter::new();
    manager
        .debug_set_relayer_options(vec![RelayerOption {
            option_id: "paid".to_owned(),
            relayer_id: None,
            kind: RelayerKind::Standard,
            fee_required: true,
        }])
        .expect("set options");

    let (_log, on_cancel) = cancel_log();
    let mut flow = ExecuteRecoveryFlow::new(manager.clone(), on_cancel);
    let err = flow
        .execute(
            recovery_wallet(),
            &sample_calls(),
            U256::from(7u64),
            5,
            137,
            "provider-x",
        )
        .expect_err("no relayer");

    assert!(err.to_string().contains("No free relayer options found"));
    assert_eq!(
        manager.debug_deleted_transactions().expect("deleted"),
        vec!["tx-1".to_owned()]
    );
    // No signature subscription was created.
    assert_eq!(flow.pending_request_id(), None);
}

#[test]
fn ready_signer_triggers_relay() {
    init_tracing();
    let manager = InMemoryManagerAdapter::new();
    let (log, on_cancel) = cancel_log();
    let mut flow = ExecuteRecoveryFlow::new(manager.clone(), on_cancel);
    flow.execute(
        recovery_wallet(),
        &sample_calls(),
        U256::from(7u64),
        5,
        137,
        "provider-x",
    )
    .expect("execute");

    let outcome = flow
        .on_signature_request_update(&ready_update("sig-req-1"))
        .expect("update");
    assert_eq!(outcome, ExecuteOutcome::Relayed);
    assert!(log.lock().unwrap_or_else(|p| p.into_inner()).is_empty());
    assert_eq!(manager.debug_handled_signers().expect("handled").len(), 1);
}

#[test]
fn user_rejection_deletes_transaction_and_fires_cancel() {
    init_tracing();
    let manager = InMemoryManagerAdapter::new();
    let (log, on_cancel) = cancel_log();
    let mut flow = ExecuteRecoveryFlow::new(manager.clone(), on_cancel);
    let tx_id = flow
        .execute(
            recovery_wallet(),
            &sample_calls(),
            U256::from(7u64),
            5,
            137,
            "provider-x",
        )
        .expect("execute");

    manager.debug_fail_next_relay_with(4001).expect("script relay");
    let outcome = flow
        .on_signature_request_update(&ready_update("sig-req-1"))
        .expect("update");
    assert_eq!(outcome, ExecuteOutcome::Cancelled);
    assert_eq!(
        manager.debug_deleted_transactions().expect("deleted"),
        vec![tx_id]
    );
    assert_eq!(
        *log.lock().unwrap_or_else(|p| p.into_inner()),
        vec!["cancelled".to_owned()]
    );
}

#[test]
fn update_for_other_request_is_ignored() {
    init_tracing();
    let manager = InMemoryManagerAdapter::new();
    let (_log, on_cancel) = cancel_log();
    let mut flow = ExecuteRecoveryFlow::new(manager.clone(), on_cancel);
    flow.execute(
        recovery_wallet(),
        &sample_calls(),
        U256::from(7u64),
        5,
        137,
        "provider-x",
    )
    .expect("execute");

    let outcome = flow
        .on_signature_request_update(&ready_update("sig-req-unrelated"))
        .expect("update");
    assert_eq!(outcome, ExecuteOutcome::Ignored);
}
